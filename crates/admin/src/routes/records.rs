//! JSON API over the record collections.
//!
//! Every collection gets the same routes under `/api/<collection>`:
//!
//! ```text
//! GET    /api/<c>               list (page, pageSize, sort, order, search, where)
//! POST   /api/<c>               create
//! GET    /api/<c>/{id}          fetch one
//! PATCH  /api/<c>/{id}          partial update
//! DELETE /api/<c>/{id}          delete
//! POST   /api/<c>/bulk-delete   delete a selection
//! GET    /api/<c>/export        CSV download (ids=a,b or the list query)
//! ```

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use dashboard_core::{DEFAULT_PAGE_SIZE, Field, Filter, PageRequest, RecordId, Sort, SortOrder};

use crate::db::records::{BulkDeleteOutcome, ListOptions, ListPage, Table};
use crate::error::AppError;
use crate::middleware::require_collection_access;
use crate::services::records_to_csv;
use crate::state::AppState;

/// Routes for the collection of `E`, guarded by its page permissions.
pub fn router<E: Table>() -> Router<AppState> {
    let base = format!("/api/{}", E::COLLECTION.name());

    Router::new()
        .route(&base, get(list::<E>).post(create::<E>))
        .route(&format!("{base}/bulk-delete"), post(bulk_delete::<E>))
        .route(&format!("{base}/export"), get(export::<E>))
        .route(
            &format!("{base}/{{id}}"),
            get(show::<E>).patch(update::<E>).delete(destroy::<E>),
        )
        .route_layer(from_fn_with_state(
            E::COLLECTION,
            require_collection_access,
        ))
}

/// Parsed list query string.
#[derive(Debug)]
pub struct ListQuery<F> {
    pub options: ListOptions<F>,
    /// Explicit selection (`ids=a,b`), used by exports.
    pub ids: Option<Vec<RecordId>>,
}

/// Parse `page`, `pageSize`, `sort`, `order`, `search`, repeated
/// `where=field:op:value` and `ids` from a raw query string.
///
/// Unknown parameters are ignored.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for non-numeric paging values and
/// `AppError::Query` for unknown fields, operators or badly typed values.
pub fn parse_list_query<F: Field>(raw: Option<&str>) -> Result<ListQuery<F>, AppError> {
    let mut options = ListOptions::default();
    let mut ids = None;
    let mut page = 1;
    let mut page_size = DEFAULT_PAGE_SIZE;
    let mut sort_field = None;
    let mut order = None;

    for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "page" => page = parse_number("page", &value)?,
            "pageSize" => page_size = parse_number("pageSize", &value)?,
            "sort" if !value.trim().is_empty() => sort_field = Some(F::from_name(&value)?),
            "order" if !value.trim().is_empty() => order = Some(value.parse::<SortOrder>()?),
            "search" => options.search = Some(value.into_owned()),
            "where" => options.filters.push(Filter::parse(&value)?),
            "ids" => {
                ids = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(RecordId::from)
                        .collect(),
                );
            }
            _ => {}
        }
    }

    options.sort = sort_field.map(|field| Sort {
        field,
        order: order.unwrap_or_default(),
    });
    options.page = PageRequest::new(page, page_size);

    Ok(ListQuery { options, ids })
}

fn parse_number(name: &str, value: &str) -> Result<u32, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{name} must be a positive integer")))
}

#[instrument(skip_all, fields(collection = E::COLLECTION.name()))]
async fn list<E: Table>(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ListPage<E>>, AppError> {
    let query = parse_list_query::<E::Field>(query.as_deref())?;
    Ok(Json(state.records().list::<E>(&query.options)?))
}

#[instrument(skip_all, fields(collection = E::COLLECTION.name()))]
async fn create<E: Table>(
    State(state): State<AppState>,
    Json(draft): Json<E::Draft>,
) -> Result<(StatusCode, Json<E>), AppError> {
    let record = state.records().create::<E>(draft)?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(skip(state), fields(collection = E::COLLECTION.name()))]
async fn show<E: Table>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<E>, AppError> {
    state
        .records()
        .get_by_id::<E>(&RecordId::new(id.as_str()))?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", E::COLLECTION)))
}

#[instrument(skip(state, patch), fields(collection = E::COLLECTION.name()))]
async fn update<E: Table>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<E::Patch>,
) -> Result<Json<E>, AppError> {
    Ok(Json(state.records().update::<E>(&RecordId::new(id), patch)?))
}

#[instrument(skip(state), fields(collection = E::COLLECTION.name()))]
async fn destroy<E: Table>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.records().delete::<E>(&RecordId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct BulkDeleteRequest {
    ids: Vec<RecordId>,
}

#[instrument(skip_all, fields(collection = E::COLLECTION.name()))]
async fn bulk_delete<E: Table>(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteOutcome>, AppError> {
    if request.ids.is_empty() {
        return Err(AppError::BadRequest("ids must not be empty".to_string()));
    }
    Ok(Json(state.records().delete_many::<E>(&request.ids)?))
}

#[instrument(skip_all, fields(collection = E::COLLECTION.name()))]
async fn export<E: Table>(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let query = parse_list_query::<E::Field>(query.as_deref())?;
    let records = match &query.ids {
        Some(ids) => state.records().get_many::<E>(ids)?,
        None => state.records().query::<E>(&query.options)?,
    };

    let csv = records_to_csv(&records)?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        E::COLLECTION.export_filename()
    ))
    .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(rows = records.len(), "Collection exported");
    Ok((
        [
            (
                CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{ProductField, UserField};
    use dashboard_core::{FieldValue, FilterOp};

    #[test]
    fn test_parse_empty_query_uses_defaults() {
        let query = parse_list_query::<UserField>(None).unwrap();
        assert_eq!(query.options.page, PageRequest::default());
        assert!(query.options.sort.is_none());
        assert!(query.options.filters.is_empty());
        assert!(query.ids.is_none());
    }

    #[test]
    fn test_parse_full_query() {
        let query = parse_list_query::<ProductField>(Some(
            "page=2&pageSize=5&sort=price&order=asc&search=lamp&where=inStock:==:true&where=price:%3E:10",
        ))
        .unwrap();

        assert_eq!(query.options.page, PageRequest::new(2, 5));
        assert_eq!(query.options.sort, Some(Sort::asc(ProductField::Price)));
        assert_eq!(query.options.search.as_deref(), Some("lamp"));
        assert_eq!(query.options.filters.len(), 2);
        assert_eq!(query.options.filters[0].field, ProductField::InStock);
        assert_eq!(query.options.filters[0].value, FieldValue::Bool(true));
        assert_eq!(query.options.filters[1].op, FilterOp::Gt);
    }

    #[test]
    fn test_parse_sort_defaults_to_descending() {
        let query = parse_list_query::<UserField>(Some("sort=createdAt")).unwrap();
        assert_eq!(query.options.sort, Some(Sort::desc(UserField::CreatedAt)));
    }

    #[test]
    fn test_parse_ids_selection() {
        let query = parse_list_query::<UserField>(Some("ids=a,%20b,,c")).unwrap();
        let ids = query.ids.unwrap();
        assert_eq!(
            ids,
            vec![RecordId::new("a"), RecordId::new("b"), RecordId::new("c")]
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            parse_list_query::<UserField>(Some("page=abc")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_list_query::<UserField>(Some("sort=nope")),
            Err(AppError::Query(_))
        ));
        assert!(matches!(
            parse_list_query::<UserField>(Some("where=role")),
            Err(AppError::Query(_))
        ));
    }
}
