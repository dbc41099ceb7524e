use crate::api::api_error::APIError;
use crate::api::model::{AlertLevel, Envelope, IdParam, ListParams};
use crate::api::server::AppState;
use crate::conditional::{
    advertised_last_modified, format_http_date, Access, ETag, HttpDate, Outcome, Preconditions,
};
use crate::entry::{EntryFields, StaticDnsEntry};
use crate::error::Error;
use crate::validate::validate;
use axum::extract::{Query, State};
use axum::http::header::{ETAG, LAST_MODIFIED};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use time::OffsetDateTime;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) const ENTRIES_PATH: &str = "/api/4.0/staticdnsentries";

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .route(
            ENTRIES_PATH,
            get(list).post(create).put(update).delete(delete),
        )
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Query(params), _): WithRejection<Query<ListParams>, APIError>,
) -> Result<Response, APIError> {
    let store = state.entry_store.read().await;
    let last_modified = store.last_modified().await;
    let advertised =
        last_modified.map(|latest| advertised_last_modified(latest, OffsetDateTime::now_utc()));

    let preconditions = Preconditions::from_headers(&headers);
    if let Outcome::NotModified { since } = preconditions.evaluate(Access::Read, last_modified) {
        tracing::debug!("no changes to static DNS entries since {}", HttpDate(since));
        let headers = validator_headers(advertised, false);
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    let entries = params.page(store.list(&params.filter()).await);
    Ok((
        validator_headers(advertised, false),
        Json(Envelope::response(entries)),
    )
        .into_response())
}

async fn create(
    State(state): State<AppState>,
    WithRejection(Json(fields), _): WithRejection<Json<EntryFields>, APIError>,
) -> Result<Response, APIError> {
    if let Err(err) = validate(&fields, state.resolver.as_ref()) {
        tracing::debug!("rejected new static DNS entry for \"{}\": {err}", fields.host);
        return Err(Error::Validation(err).into());
    }

    let entry = state.entry_store.write().await.insert(fields).await?;
    tracing::info!(
        "created static DNS entry {} for \"{}\" in {}",
        entry.id,
        entry.host(),
        entry.fields.deliveryservice
    );
    Ok(entry_response(
        StatusCode::CREATED,
        "staticDNSEntry was created.",
        entry,
    ))
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Query(IdParam { id }), _): WithRejection<Query<IdParam>, APIError>,
    WithRejection(Json(fields), _): WithRejection<Json<EntryFields>, APIError>,
) -> Result<Response, APIError> {
    let mut store = state.entry_store.write().await;
    let current = store.get(id).await.ok_or(Error::NotFound(id))?;

    let preconditions = Preconditions::from_headers(&headers);
    if let Outcome::PreconditionFailed(failure) =
        preconditions.evaluate(Access::Write, Some(current.last_updated))
    {
        tracing::debug!("rejected update of static DNS entry {id}: {failure}");
        return Err(Error::PreconditionFailed(failure).into());
    }

    if let Err(err) = validate(&fields, state.resolver.as_ref()) {
        tracing::debug!("rejected update of static DNS entry {id}: {err}");
        return Err(Error::Validation(err).into());
    }

    let entry = store.replace(id, fields, current.last_updated).await?;
    tracing::info!("updated static DNS entry {id} for \"{}\"", entry.host());
    Ok(entry_response(
        StatusCode::OK,
        "staticDNSEntry was updated.",
        entry,
    ))
}

async fn delete(
    State(state): State<AppState>,
    WithRejection(Query(IdParam { id }), _): WithRejection<Query<IdParam>, APIError>,
) -> Result<Json<Envelope<()>>, APIError> {
    let entry = state.entry_store.write().await.delete(id).await?;
    tracing::info!("deleted static DNS entry {id} for \"{}\"", entry.host());
    Ok(Json(Envelope::alert(
        AlertLevel::Success,
        "staticDNSEntry was deleted.",
    )))
}

fn entry_response(status: StatusCode, text: &str, entry: StaticDnsEntry) -> Response {
    (
        status,
        validator_headers(Some(entry.last_updated), true),
        Json(Envelope::success(text, entry)),
    )
        .into_response()
}

/// `Last-Modified` and, optionally, `ETag` headers for a representation last updated at
/// `last_updated`.
fn validator_headers(last_updated: Option<OffsetDateTime>, with_etag: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some(last_updated) = last_updated else {
        return headers;
    };
    let date = format_http_date(last_updated);
    if let Some(value) = date.and_then(|d| HeaderValue::from_str(&d).ok()) {
        headers.insert(LAST_MODIFIED, value);
    }
    if with_etag {
        if let Ok(value) = HeaderValue::from_str(ETag::for_last_updated(last_updated).as_str()) {
            headers.insert(ETAG, value);
        }
    }
    headers
}
