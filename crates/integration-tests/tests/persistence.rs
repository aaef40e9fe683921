//! Data survives a restart on file storage; corrupt data does not crash it.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

use dashboard_admin::AppState;
use dashboard_admin::storage::FileStorage;
use dashboard_core::Email;
use dashboard_integration_tests::{ADMIN_EMAIL, SEED_PASSWORD, TestServer, test_config};

/// Offline edits to the data directory, as the CLI makes them, are picked
/// up by the next server start.
#[tokio::test]
async fn test_offline_password_change_applies_on_next_start() {
    let dir = tempfile::tempdir().unwrap();

    {
        let offline =
            AppState::with_storage(test_config(), Arc::new(FileStorage::open(dir.path()).unwrap()))
                .unwrap();
        let admin = offline
            .auth()
            .identities()
            .get_by_email(&Email::parse(ADMIN_EMAIL).unwrap())
            .unwrap()
            .unwrap();
        offline
            .auth()
            .set_password(&admin.identity.uid, "rotated-offline-pass")
            .unwrap();
    }

    let server =
        TestServer::start_with_storage(Arc::new(FileStorage::open(dir.path()).unwrap())).await;
    server.login(ADMIN_EMAIL, "rotated-offline-pass").await;

    let resp = server
        .request(Method::POST, "/auth/login", None)
        .form(&[("email", ADMIN_EMAIL), ("password", SEED_PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_ne!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_records_and_identities_survive_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let server =
            TestServer::start_with_storage(Arc::new(FileStorage::open(dir.path()).unwrap())).await;
        let token = server.login_admin().await;

        let resp = server
            .request(Method::POST, "/api/products", Some(&token))
            .json(&json!({ "id": "kept", "name": "Kept", "price": 3.5 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = server
            .request(Method::POST, "/auth/register", None)
            .form(&[("email", "later@example.com"), ("password", "persisted-pass")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    let server =
        TestServer::start_with_storage(Arc::new(FileStorage::open(dir.path()).unwrap())).await;
    let token = server.login_admin().await;

    let product: Value = server
        .get("/api/products/kept", Some(&token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(product["name"], "Kept");

    let list: Value = server
        .get("/api/products", Some(&token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(list["totalCount"], 11);

    server.login("later@example.com", "persisted-pass").await;
}

#[tokio::test]
async fn test_corrupt_collection_falls_back_to_seed_and_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let products_file = dir.path().join("mock_products.json");
    std::fs::write(&products_file, "{ not json").unwrap();

    let server =
        TestServer::start_with_storage(Arc::new(FileStorage::open(dir.path()).unwrap())).await;
    let token = server.login_admin().await;

    let list: Value = server
        .get("/api/products", Some(&token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(list["totalCount"], 10);
    assert_eq!(std::fs::read_to_string(&products_file).unwrap(), "{ not json");
}
