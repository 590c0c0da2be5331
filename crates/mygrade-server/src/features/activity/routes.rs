use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::{response::ApiResponse, AppState};
use crate::error::AppError;
use crate::features::auth::gate::{self, LOGIN_PATH};
use crate::features::record::{viewer, LOOKUP_PATH};
use crate::session::{ActivityKind, WatchStatus};

pub fn activity_routes() -> Router<AppState> {
    Router::new().route("/activity", post(activity_handler))
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActivityRequest {
    pub kind: ActivityKind,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityResponse {
    pub admin: WatchStatus,
    pub viewer: WatchStatus,
    /// Where the page should go when one of its sessions expired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

/// Activity heartbeat from a page
///
/// Pointer moves, key presses, clicks and scrolls reset both the admin and
/// the student-view watchdogs of this browser.
///
/// # Endpoint
/// `POST /activity`
///
/// # Request Body
/// ```json
/// { "kind": "pointer_move" }
/// ```
#[tracing::instrument(skip(state, session))]
async fn activity_handler(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = gate::record_admin_activity(&state, &session, request.kind).await?;
    let viewer = viewer::touch(&state, &session, request.kind).await?;

    let redirect = if admin == WatchStatus::Expired {
        Some(LOGIN_PATH)
    } else if viewer == WatchStatus::Expired {
        Some(LOOKUP_PATH)
    } else {
        None
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(ActivityResponse {
            admin,
            viewer,
            redirect,
        })),
    ))
}
