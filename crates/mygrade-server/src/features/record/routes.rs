use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_sessions::Session;

use super::{breakdown::RecordView, viewer};
use crate::api::{
    response::{ApiResponse, ErrorResponse},
    AppState,
};
use crate::session::{ActivityKind, SnapshotError};

/// Where a browser without a saved record is sent
pub const LOOKUP_PATH: &str = "/";

pub fn record_routes() -> Router<AppState> {
    Router::new().route("/record", get(get_record).delete(clear_record))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum RecordApiError {
    NoRecord,
    Session(SnapshotError),
}

impl From<SnapshotError> for RecordApiError {
    fn from(err: SnapshotError) -> Self {
        RecordApiError::Session(err)
    }
}

impl IntoResponse for RecordApiError {
    fn into_response(self) -> Response {
        match self {
            RecordApiError::NoRecord => ErrorResponse::with_details(
                "NOT_FOUND",
                "No student record in this session.",
                json!({ "redirect": LOOKUP_PATH }),
            )
            .into_response_with(StatusCode::NOT_FOUND),
            RecordApiError::Session(e) => {
                tracing::error!("Record session failure: {}", e);
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Breakdown of the record saved by the last lookup
///
/// # Endpoint
/// `GET /record`
///
/// # Response
/// - 200: the breakdown view
/// - 404: nothing saved, or the view expired after inactivity
#[tracing::instrument(skip(state, session))]
async fn get_record(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, RecordApiError> {
    let snapshot = viewer::current(&state, &session, ActivityKind::Click)
        .await?
        .ok_or(RecordApiError::NoRecord)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(RecordView::from_snapshot(&snapshot))),
    ))
}

/// Leave the record view
///
/// # Endpoint
/// `DELETE /record`
#[tracing::instrument(skip(state, session))]
async fn clear_record(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, RecordApiError> {
    viewer::close(&state, &session).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(json!({ "redirect": LOOKUP_PATH }))),
    ))
}
