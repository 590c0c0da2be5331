//! Explicit confirmation for destructive operations
//!
//! Deletes only run when the request carries `?confirm=true`. Without it the
//! API answers `409 CONFIRMATION_REQUIRED` with the prompt to show the user.

use axum::{http::StatusCode, response::Response};
use serde::Deserialize;
use serde_json::json;

use crate::api::response::ErrorResponse;

pub const CONFIRMATION_REQUIRED: &str = "CONFIRMATION_REQUIRED";

/// `?confirm=true`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
}

pub fn confirmation_required(prompt: &str) -> Response {
    ErrorResponse::with_details(CONFIRMATION_REQUIRED, prompt, json!({ "prompt": prompt }))
        .into_response_with(StatusCode::CONFLICT)
}
