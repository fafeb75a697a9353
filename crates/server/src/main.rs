use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use server_api::ApiContext;
use shared::{
    domain::{Attendee, AttendeeId, Event, EventId},
    error::{ApiError, ErrorCode},
    protocol::{CreateEventRequest, DeleteEventResponse, UpdateAttendeeRequest},
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, normalize_database_url};

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.max_upload_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, max_upload_bytes = settings.max_upload_bytes, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/events", get(http_list_events).post(http_create_event))
        .route("/events/:event_id", get(http_get_event).delete(http_delete_event))
        .route("/events/:event_id/export", get(http_export_event))
        .route("/attendees/:attendee_id", patch(http_update_attendee))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::map_response(json_payload_too_large))
        .with_state(state)
}

// RequestBodyLimitLayer answers an oversized Content-Length with a plain-text 413.
async fn json_payload_too_large(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE || is_json {
        return response;
    }
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(ApiError::new(
            ErrorCode::Validation,
            "Request body is larger than the upload limit",
        )),
    )
        .into_response()
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

// Rejections keep axum's status (400/413/415/422) but use the JSON error body.
fn invalid_body(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    (
        rejection.status(),
        Json(ApiError::new(ErrorCode::Validation, rejection.body_text())),
    )
}

fn invalid_path(rejection: PathRejection) -> (StatusCode, Json<ApiError>) {
    (
        rejection.status(),
        Json(ApiError::new(ErrorCode::Validation, rejection.body_text())),
    )
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state.api.storage.health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        reject(ApiError::internal("database unavailable"))
    })?;
    Ok("ok")
}

async fn http_list_events(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Event>>> {
    let events = server_api::list_events(&state.api).await.map_err(reject)?;
    Ok(Json(events))
}

async fn http_get_event(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Event>> {
    let Path(event_id) = path.map_err(invalid_path)?;
    let event = server_api::get_event(&state.api, EventId(event_id))
        .await
        .map_err(reject)?;
    Ok(Json(event))
}

async fn http_create_event(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let Json(req) = body.map_err(invalid_body)?;
    info!(name = %req.name, attendees = req.attendees.len(), "creating event");
    let event = server_api::create_event(&state.api, req)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn http_delete_event(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<DeleteEventResponse>> {
    let Path(event_id) = path.map_err(invalid_path)?;
    let response = server_api::delete_event(&state.api, EventId(event_id))
        .await
        .map_err(reject)?;
    Ok(Json(response))
}

async fn http_update_attendee(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateAttendeeRequest>, JsonRejection>,
) -> ApiResult<Json<Attendee>> {
    let Path(attendee_id) = path.map_err(invalid_path)?;
    let Json(req) = body.map_err(invalid_body)?;
    let attendee = server_api::update_attendee(&state.api, AttendeeId(attendee_id), req.status)
        .await
        .map_err(reject)?;
    Ok(Json(attendee))
}

async fn http_export_event(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(event_id) = path.map_err(invalid_path)?;
    let exported = server_api::export_event(&state.api, EventId(event_id))
        .await
        .map_err(reject)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(roster::XLSX_CONTENT_TYPE),
    );
    let ascii_name: String = exported
        .filename
        .chars()
        .map(|c| match c {
            '"' => '\'',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    let disposition = format!("attachment; filename=\"{ascii_name}\"");
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(error) => warn!(%event_id, %error, "skipping content-disposition header"),
    }

    Ok((StatusCode::OK, headers, exported.bytes))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
