//! Server-rendered pages
//!
//! Public:
//! - `/` - grade lookup
//! - `/viewrecord` - the saved record's breakdown
//! - `/admin-login`
//!
//! Behind the admin gate:
//! - `/admin` - redirects to the dashboard
//! - `/admin/dashboard`
//! - `/admin/classrecord` and `/admin/classrecord/:class_id`
//! - `/admin/logout`

pub mod layout;
pub mod pages;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::api::AppState;
use crate::features::auth::require_admin_page;
use crate::features::grades::commands::upload::UPLOAD_BODY_LIMIT;
use pages::{classes, dashboard, login, sheet, student};

pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/admin", get(login::admin_home))
        .route("/admin/dashboard", get(dashboard::dashboard_page))
        .route(
            "/admin/classrecord",
            get(classes::roster_page).post(classes::create_class),
        )
        .route("/admin/classrecord/:class_id", get(sheet::sheet_page))
        .route("/admin/classrecord/:class_id/edit", post(classes::update_class))
        .route("/admin/classrecord/:class_id/delete", post(classes::delete_class))
        .route(
            "/admin/classrecord/:class_id/upload",
            post(sheet::upload_sheet)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/admin/classrecord/:class_id/rows/:id_number",
            post(sheet::edit_sheet_row),
        )
        .route(
            "/admin/classrecord/:class_id/rows/:id_number/delete",
            post(sheet::delete_sheet_row),
        )
        .route("/admin/logout", get(login::logout))
        .route_layer(from_fn_with_state(state, require_admin_page));

    Router::new()
        .route("/", get(student::lookup_page).post(student::lookup_submit))
        .route("/viewrecord", get(student::record_page))
        .route("/viewrecord/back", post(student::leave_record))
        .route(
            "/admin-login",
            get(login::login_page).post(login::login_submit),
        )
        .merge(admin)
}
