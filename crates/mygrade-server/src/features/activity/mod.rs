//! Activity heartbeat shared by admin pages and the student record view

pub mod routes;

pub use routes::{activity_routes, ActivityRequest, ActivityResponse};
