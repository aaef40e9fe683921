//! Sign-in, registration, sign-out and account settings.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::extract::FormOrJson;
use crate::error::{AppError, clear_sentry_user};
use crate::middleware::route_guard::{HOME_PATH, LOGIN_PATH};
use crate::middleware::{RequireIdentity, clear_session_cookie, session_cookie};
use crate::models::Identity;
use crate::services::Session;
use crate::services::auth::MIN_PASSWORD_LENGTH;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/register", get(register_page).post(register))
        .route("/auth/logout", post(logout))
        .route("/api/auth/me", get(me).patch(update_profile))
        .route("/api/auth/password", post(change_password))
}

/// Context for the sign-in and registration pages.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthPage {
    title: &'static str,
    action: &'static str,
    alternate_href: &'static str,
    min_password_length: usize,
}

async fn login_page() -> Json<AuthPage> {
    Json(AuthPage {
        title: "Sign in",
        action: LOGIN_PATH,
        alternate_href: "/auth/register",
        min_password_length: MIN_PASSWORD_LENGTH,
    })
}

async fn register_page() -> Json<AuthPage> {
    Json(AuthPage {
        title: "Create account",
        action: "/auth/register",
        alternate_href: LOGIN_PATH,
        min_password_length: MIN_PASSWORD_LENGTH,
    })
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

#[instrument(skip_all, fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    FormOrJson(form): FormOrJson<LoginForm>,
) -> Result<Response, AppError> {
    let session = state.auth().authenticate(&form.email, &form.password)?;
    signed_in(&state, &session)
}

#[derive(Deserialize)]
struct RegisterForm {
    email: String,
    password: String,
    #[serde(default, alias = "displayName")]
    name: String,
}

#[instrument(skip_all, fields(email = %form.email))]
async fn register(
    State(state): State<AppState>,
    FormOrJson(form): FormOrJson<RegisterForm>,
) -> Result<Response, AppError> {
    let session = state
        .auth()
        .create_identity(&form.email, &form.password, &form.name)?;
    signed_in(&state, &session)
}

/// Set the session cookie and send the browser to the dashboard.
fn signed_in(state: &AppState, session: &Session) -> Result<Response, AppError> {
    let cookie = session_cookie(&session.token, state.config().secure_cookies())
        .map_err(|e| AppError::Internal(format!("session cookie: {e}")))?;
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(HOME_PATH)).into_response())
}

async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    (
        AppendHeaders([(
            SET_COOKIE,
            clear_session_cookie(state.config().secure_cookies()),
        )]),
        Redirect::to(LOGIN_PATH),
    )
}

async fn me(RequireIdentity(identity): RequireIdentity) -> Json<Identity> {
    Json(identity)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileForm {
    display_name: String,
    #[serde(rename = "photoURL", default)]
    photo_url: Option<String>,
}

#[instrument(skip_all, fields(uid = %identity.uid))]
async fn update_profile(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    Json(form): Json<ProfileForm>,
) -> Result<Json<Identity>, AppError> {
    let photo_url = form.photo_url.filter(|url| !url.trim().is_empty());
    let updated = state
        .auth()
        .update_profile(&identity.uid, &form.display_name, photo_url)?;
    Ok(Json(updated))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordForm {
    current_password: String,
    new_password: String,
    confirm_password: String,
}

#[instrument(skip_all, fields(uid = %identity.uid))]
async fn change_password(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    Json(form): Json<PasswordForm>,
) -> Result<StatusCode, AppError> {
    if form.new_password != form.confirm_password {
        return Err(AppError::BadRequest("passwords do not match".to_string()));
    }
    state
        .auth()
        .change_password(&identity.uid, &form.current_password, &form.new_password)?;
    Ok(StatusCode::NO_CONTENT)
}
