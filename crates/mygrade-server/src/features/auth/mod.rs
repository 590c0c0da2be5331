//! Administrator sign-in, sign-out and the admin gate

pub mod commands;
pub mod gate;
pub mod routes;

pub use commands::{SignInCommand, SignInError, SignOutCommand, SignOutError};
pub use gate::{
    require_admin_api, require_admin_page, AuthGate, AuthState, CurrentAdmin, GateDecision,
    LOGIN_PATH, SESSION_EXPIRED_NOTICE,
};
pub use routes::{admin_routes, auth_routes};
