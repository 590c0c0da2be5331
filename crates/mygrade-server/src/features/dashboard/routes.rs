use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use futures::StreamExt;
use serde::Serialize;
use std::convert::Infallible;

use super::{
    calendar::MonthCalendar,
    queries::{live_stats, DashboardStats, DashboardStatsError, DashboardStatsQuery},
};
use crate::api::{
    response::{ApiResponse, ErrorResponse},
    AppState,
};
use crate::features::auth::CurrentAdmin;
use crate::features::shared::live::{admin_sse, frame};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_dashboard))
        .route("/live", get(live_dashboard))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub calendar: MonthCalendar,
}

/// Current dashboard numbers and this month's calendar
///
/// # Endpoint
/// `GET /dashboard`
#[tracing::instrument(skip(state))]
async fn get_dashboard(State(state): State<AppState>) -> Result<Response, DashboardApiError> {
    let stats = super::queries::stats::handle(state.store.as_ref(), DashboardStatsQuery).await?;

    let response = DashboardResponse {
        stats,
        calendar: MonthCalendar::current(),
    };
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// Live dashboard numbers
///
/// # Endpoint
/// `GET /dashboard/live`
///
/// # Response
/// Server-sent events; a `snapshot` event with fresh stats after every
/// change to `students` or `classes`.
#[tracing::instrument(skip(state, admin))]
async fn live_dashboard(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentAdmin>,
) -> impl IntoResponse {
    let events = live_stats(state.store.clone()).map(|result| Ok::<_, Infallible>(frame(result)));
    admin_sse(events, admin.auth)
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum DashboardApiError {
    Stats(DashboardStatsError),
}

impl From<DashboardStatsError> for DashboardApiError {
    fn from(err: DashboardStatsError) -> Self {
        Self::Stats(err)
    }
}

impl IntoResponse for DashboardApiError {
    fn into_response(self) -> Response {
        match self {
            DashboardApiError::Stats(DashboardStatsError::Store(e)) => {
                tracing::error!("Database error during dashboard aggregation: {}", e);
                ErrorResponse::new("INTERNAL_ERROR", "Database error.")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}
