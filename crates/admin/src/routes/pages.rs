//! Dashboard page contexts.
//!
//! Each page returns the JSON a front end needs to render it: the signed-in
//! identity, the sidebar for its role and the page's own data. Access control
//! happens in [`route_guard`](crate::middleware::route_guard) before these run.

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    routing::get,
};
use serde::Serialize;
use tracing::instrument;

use super::records::parse_list_query;
use crate::db::records::{ListPage, Table};
use crate::error::AppError;
use crate::middleware::RequireIdentity;
use crate::models::{Entity, Identity, ProductRecord, UserRecord};
use crate::services::auth::MIN_PASSWORD_LENGTH;
use crate::services::stats::{self, DashboardStats, ReportStats};
use crate::services::{NavItem, navigation};
use crate::state::AppState;

const REPORTS_PATH: &str = "/dashboard/reports";
const SETTINGS_PATH: &str = "/dashboard/settings";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/dashboard", get(dashboard))
        .route(
            UserRecord::COLLECTION.page_route(),
            get(collection_page::<UserRecord>),
        )
        .route(
            ProductRecord::COLLECTION.page_route(),
            get(collection_page::<ProductRecord>),
        )
        .route(REPORTS_PATH, get(reports))
        .route(SETTINGS_PATH, get(settings))
}

/// Fields every dashboard page shares.
#[derive(Debug, Serialize)]
struct Layout {
    user: Identity,
    navigation: Vec<NavItem>,
}

impl Layout {
    fn new(user: Identity, current: &str) -> Self {
        let navigation = navigation(user.role, current);
        Self { user, navigation }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Landing {
    title: &'static str,
    login_href: &'static str,
    register_href: &'static str,
}

async fn landing() -> Json<Landing> {
    Json(Landing {
        title: "Admin Dashboard",
        login_href: "/auth/login",
        register_href: "/auth/register",
    })
}

#[derive(Debug, Serialize)]
struct DashboardPage {
    #[serde(flatten)]
    layout: Layout,
    greeting: String,
    stats: DashboardStats,
}

#[instrument(skip_all, fields(uid = %user.uid))]
async fn dashboard(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<Json<DashboardPage>, AppError> {
    let stats = stats::dashboard(state.records())?;
    let greeting = format!("Welcome, {}", user.label());
    Ok(Json(DashboardPage {
        layout: Layout::new(user, "/dashboard"),
        greeting,
        stats,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionPage<E> {
    #[serde(flatten)]
    layout: Layout,
    collection: &'static str,
    api_href: String,
    export_href: String,
    records: ListPage<E>,
}

#[instrument(skip_all, fields(uid = %user.uid, collection = E::COLLECTION.name()))]
async fn collection_page<E: Table>(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
    RawQuery(query): RawQuery,
) -> Result<Json<CollectionPage<E>>, AppError> {
    let query = parse_list_query::<E::Field>(query.as_deref())?;
    let records = state.records().list::<E>(&query.options)?;
    let api_href = format!("/api/{}", E::COLLECTION.name());

    Ok(Json(CollectionPage {
        layout: Layout::new(user, E::COLLECTION.page_route()),
        collection: E::COLLECTION.name(),
        export_href: format!("{api_href}/export"),
        api_href,
        records,
    }))
}

#[derive(Debug, Serialize)]
struct ReportsPage {
    #[serde(flatten)]
    layout: Layout,
    reports: ReportStats,
}

#[instrument(skip_all, fields(uid = %user.uid))]
async fn reports(
    State(state): State<AppState>,
    RequireIdentity(user): RequireIdentity,
) -> Result<Json<ReportsPage>, AppError> {
    let reports = stats::reports(state.records())?;
    Ok(Json(ReportsPage {
        layout: Layout::new(user, REPORTS_PATH),
        reports,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsPage {
    #[serde(flatten)]
    layout: Layout,
    profile_href: &'static str,
    password_href: &'static str,
    min_password_length: usize,
}

async fn settings(RequireIdentity(user): RequireIdentity) -> Json<SettingsPage> {
    Json(SettingsPage {
        layout: Layout::new(user, SETTINGS_PATH),
        profile_href: "/api/auth/me",
        password_href: "/api/auth/password",
        min_password_length: MIN_PASSWORD_LENGTH,
    })
}
