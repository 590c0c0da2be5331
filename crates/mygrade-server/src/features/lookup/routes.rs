use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tower_sessions::Session;

use super::queries::find_student::{self, FindStudentError, FindStudentQuery};
use crate::api::{
    response::{ApiResponse, ErrorResponse},
    AppState,
};
use crate::features::record::viewer;
use crate::session::SnapshotError;

pub fn lookup_routes() -> Router<AppState> {
    Router::new().route("/lookup", post(find_student_handler))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum LookupApiError {
    Find(FindStudentError),
    Session(SnapshotError),
}

impl From<FindStudentError> for LookupApiError {
    fn from(err: FindStudentError) -> Self {
        LookupApiError::Find(err)
    }
}

impl From<SnapshotError> for LookupApiError {
    fn from(err: SnapshotError) -> Self {
        LookupApiError::Session(err)
    }
}

impl IntoResponse for LookupApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            LookupApiError::Find(FindStudentError::Validation(e)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            },
            LookupApiError::Find(e @ (FindStudentError::NotFound | FindStudentError::Mismatch)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
            },
            LookupApiError::Find(FindStudentError::Store(e)) => {
                tracing::error!("Student lookup failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Database error.".to_string(),
                )
            },
            LookupApiError::Session(e) => {
                tracing::error!("Failed to save student snapshot: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            },
        };

        ErrorResponse::new(code, message).into_response_with(status)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Look up a student record and save it for the detail view
///
/// # Endpoint
/// `POST /lookup`
///
/// # Request Body
/// ```json
/// { "firstName": "John", "lastName": "Doe", "idNumber": "2022123456" }
/// ```
///
/// # Response
/// - 200: the snapshot and its midterm grade badge
/// - 400: a field is blank
/// - 404: unknown ID, or the names do not match it
#[tracing::instrument(skip(state, session, query))]
async fn find_student_handler(
    State(state): State<AppState>,
    session: Session,
    Json(query): Json<FindStudentQuery>,
) -> Result<impl IntoResponse, LookupApiError> {
    let response = find_student::handle(state.store.as_ref(), query).await?;
    viewer::open(&state, &session, &response.student).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))))
}
