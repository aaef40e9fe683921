//! Edge route protection and the role gate.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use dashboard_integration_tests::{TestServer, location, session_set_cookie};

#[tokio::test]
async fn test_anonymous_can_open_public_pages() {
    let server = TestServer::start().await;

    for path in ["/", "/auth/login", "/auth/register"] {
        let resp = server.get(path, None).await;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_anonymous_is_redirected_to_login() {
    let server = TestServer::start().await;

    for path in ["/dashboard", "/dashboard/users", "/dashboard/settings"] {
        let resp = server.get(path, None).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp).as_deref(), Some("/auth/login"));
    }
}

#[tokio::test]
async fn test_signed_in_user_is_bounced_from_public_pages() {
    let server = TestServer::start().await;
    let token = server.login_user().await;

    for path in ["/", "/auth/login", "/auth/register"] {
        let resp = server.get(path, Some(&token)).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp).as_deref(), Some("/dashboard"));
    }
}

#[tokio::test]
async fn test_any_cookie_counts_as_signed_in_on_public_pages() {
    let server = TestServer::start().await;

    let resp = server.get("/auth/login", Some("garbage")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/dashboard"));
}

#[tokio::test]
async fn test_unresolvable_cookie_is_cleared() {
    let server = TestServer::start().await;

    let resp = server.get("/dashboard", Some("not.a-token")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/auth/login"));

    let cookie = session_set_cookie(&resp).unwrap();
    assert!(cookie.starts_with("session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_role_gate_on_pages() {
    let server = TestServer::start().await;
    let user = server.login_user().await;
    let admin = server.login_admin().await;

    for path in ["/dashboard", "/dashboard/reports", "/dashboard/settings"] {
        assert_eq!(server.get(path, Some(&user)).await.status(), StatusCode::OK, "{path}");
    }
    for path in ["/dashboard/users", "/dashboard/products"] {
        assert_eq!(
            server.get(path, Some(&user)).await.status(),
            StatusCode::FORBIDDEN,
            "{path}"
        );
        assert_eq!(server.get(path, Some(&admin)).await.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_unknown_dashboard_route_is_admin_only() {
    let server = TestServer::start().await;
    let user = server.login_user().await;
    let admin = server.login_admin().await;

    let resp = server.get("/dashboard/audit-log", Some(&user)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = server.get("/dashboard/audit-log", Some(&admin)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_uses_page_permissions() {
    let server = TestServer::start().await;
    let user = server.login_user().await;
    let admin = server.login_admin().await;

    for path in ["/api/users", "/api/products", "/api/products/export"] {
        assert_eq!(server.get(path, None).await.status(), StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(
            server.get(path, Some(&user)).await.status(),
            StatusCode::FORBIDDEN,
            "{path}"
        );
        assert_eq!(server.get(path, Some(&admin)).await.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_navigation_follows_role() {
    let server = TestServer::start().await;
    let user = server.login_user().await;

    let body: serde_json::Value = server
        .get("/dashboard", Some(&user))
        .await
        .json()
        .await
        .unwrap();

    let names: Vec<&str> = body["navigation"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Dashboard", "Reports", "Settings"]);
    assert_eq!(body["navigation"][0]["active"], true);
    assert_eq!(body["user"]["role"], "user");
}
