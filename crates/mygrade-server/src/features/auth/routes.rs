use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use tower_sessions::Session;

use super::commands::{
    sign_in::{self, SignInCommand, SignInError},
    sign_out::{self, SignOutCommand, SignOutError},
};
use super::gate::{arm_admin_watchdog, CurrentAdmin, ADMIN_HOME_PATH, LOGIN_PATH};
use crate::api::{
    response::{ApiResponse, ErrorResponse},
    AppState,
};
use crate::identity::AdminUser;
use crate::session;

/// Sign-in and sign-out; open to everyone
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in", post(sign_in_handler))
        .route("/auth/sign-out", post(sign_out_handler))
}

/// Routes that sit behind the admin gate
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me_handler))
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    user: AdminUser,
    redirect: &'static str,
}

#[derive(Debug, Serialize)]
struct SignedOutResponse {
    redirect: &'static str,
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AuthApiError {
    SignIn(SignInError),
    SignOut(SignOutError),
    Session(tower_sessions::session::Error),
}

impl From<SignInError> for AuthApiError {
    fn from(err: SignInError) -> Self {
        AuthApiError::SignIn(err)
    }
}

impl From<SignOutError> for AuthApiError {
    fn from(err: SignOutError) -> Self {
        AuthApiError::SignOut(err)
    }
}

impl From<tower_sessions::session::Error> for AuthApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        AuthApiError::Session(err)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthApiError::SignIn(e) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string()),
            AuthApiError::SignOut(e) => {
                tracing::error!("Sign-out failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            },
            AuthApiError::Session(e) => {
                tracing::error!("Session failure during authentication: {}", e);
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

/// Sign an administrator in
///
/// # Endpoint
/// `POST /auth/sign-in`
///
/// # Request Body
/// ```json
/// { "email": "admin@school.edu", "password": "..." }
/// ```
///
/// # Response
/// - 200: signed in; the session now carries the admin token
/// - 401: "Invalid email or password."
#[tracing::instrument(skip(state, session, command))]
async fn sign_in_handler(
    State(state): State<AppState>,
    session: Session,
    Json(command): Json<SignInCommand>,
) -> Result<impl IntoResponse, AuthApiError> {
    let auth = sign_in::handle(state.identity.as_ref(), command).await?;

    session::set_admin_token(&session, &auth.token).await?;
    arm_admin_watchdog(&state, &auth.token);

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(AuthResponse {
            user: auth.user,
            redirect: ADMIN_HOME_PATH,
        })),
    ))
}

/// Sign the current administrator out
///
/// # Endpoint
/// `POST /auth/sign-out`
#[tracing::instrument(skip(state, session))]
async fn sign_out_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AuthApiError> {
    if let Some(token) = session::clear_admin_token(&session).await? {
        sign_out::handle(
            state.identity.as_ref(),
            &state.activity,
            SignOutCommand { token },
        )
        .await?;
    }

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(SignedOutResponse {
            redirect: LOGIN_PATH,
        })),
    ))
}

/// The signed-in administrator
///
/// # Endpoint
/// `GET /auth/me`
async fn me_handler(Extension(admin): Extension<CurrentAdmin>) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::success(admin.user)))
}
