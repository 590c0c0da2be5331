//! Feature slices of the MyGrade JSON API
//!
//! Each slice keeps its write operations in `commands/`, its reads in
//! `queries/` and its HTTP surface in `routes.rs`.
//!
//! # Features
//!
//! - **lookup**: public student grade lookup
//! - **record**: the session-scoped breakdown view opened by a lookup
//! - **activity**: interaction heartbeats feeding the inactivity watchdogs
//! - **auth**: administrator sign-in/out and the admin gate
//! - **classes**: class roster management with cascade delete
//! - **grades**: spreadsheet upload, the grade grid and row edits
//! - **dashboard**: aggregate counts and the month calendar

pub mod activity;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod grades;
pub mod lookup;
pub mod record;
pub mod shared;

use axum::{middleware::from_fn_with_state, Router};

use crate::api::AppState;

/// Creates the API router, mounted by the application under `/api/v1`
///
/// Public routes:
/// - `/lookup`, `/record` - student lookup and breakdown view
/// - `/activity` - inactivity heartbeat
/// - `/auth/sign-in`, `/auth/sign-out`
///
/// Routes behind the admin gate:
/// - `/auth/me`
/// - `/classes` - classes and their grade sheets
/// - `/dashboard`
pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .merge(auth::admin_routes())
        .nest(
            "/classes",
            classes::classes_routes().merge(grades::grades_routes()),
        )
        .nest("/dashboard", dashboard::dashboard_routes())
        .route_layer(from_fn_with_state(state, auth::require_admin_api));

    Router::new()
        .merge(lookup::lookup_routes())
        .merge(record::record_routes())
        .merge(activity::activity_routes())
        .merge(auth::auth_routes())
        .merge(admin)
}
