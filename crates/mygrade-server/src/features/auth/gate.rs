//! Admin authentication gate
//!
//! Every admin page and admin API call passes through the gate. It reads
//! the token saved in the session, checks the inactivity watchdog, then asks
//! the identity service for the token's auth state and feeds it to
//! [`AuthGate`]:
//!
//! ```text
//! Checking --(user)--> Authenticated(user)
//!     \------(none)--> Unauthenticated
//! ```
//!
//! `Checking` renders nothing, `Unauthenticated` goes to the login page and
//! `Authenticated` admits the request with the watchdog running. An expired
//! watchdog signs the administrator out and leaves a notice for the login
//! page.

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::api::{response::ErrorResponse, AppState};
use crate::error::AppError;
use crate::identity::{AdminUser, AuthStateReceiver};
use crate::session::{self, ActivityKind, WatchKey, WatchStatus};

pub const LOGIN_PATH: &str = "/admin-login";
pub const ADMIN_HOME_PATH: &str = "/admin";
pub const SESSION_EXPIRED_NOTICE: &str = "Session expired due to inactivity.";

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Checking,
    Authenticated(AdminUser),
    Unauthenticated,
}

/// What the inactivity watchdog should do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogAction {
    Start,
    Stop,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Auth state not known yet
    Wait,
    Redirect(&'static str),
    Render(AdminUser),
}

#[derive(Debug, Default)]
pub struct AuthGate {
    state: AuthState,
}

impl AuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Apply an auth-state update. The gate never returns to `Checking`.
    pub fn on_auth_state_changed(&mut self, user: Option<AdminUser>) -> WatchdogAction {
        let next = match user {
            Some(user) => AuthState::Authenticated(user),
            None => AuthState::Unauthenticated,
        };

        let action = match (&self.state, &next) {
            (AuthState::Authenticated(_), AuthState::Authenticated(_)) => WatchdogAction::Keep,
            (_, AuthState::Authenticated(_)) => WatchdogAction::Start,
            (AuthState::Authenticated(_), _) => WatchdogAction::Stop,
            _ => WatchdogAction::Keep,
        };

        self.state = next;
        action
    }

    pub fn decision(&self) -> GateDecision {
        match &self.state {
            AuthState::Checking => GateDecision::Wait,
            AuthState::Unauthenticated => GateDecision::Redirect(LOGIN_PATH),
            AuthState::Authenticated(user) => GateDecision::Render(user.clone()),
        }
    }
}

// ============================================================================
// Request gate
// ============================================================================

/// The administrator behind an admitted request
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub user: AdminUser,
    pub token: String,
    /// Ends live streams when the administrator signs out
    pub auth: AuthStateReceiver,
}

#[derive(Debug)]
pub enum GateOutcome {
    Admitted(CurrentAdmin),
    /// The inactivity watchdog fired; the administrator has been signed out
    Expired,
    Redirect,
    Wait,
}

/// Start the admin watchdog for `token`. Expiry signs the token out.
pub fn arm_admin_watchdog(state: &AppState, token: &str) {
    let identity = state.identity.clone();
    let expired = token.to_string();
    state.activity.arm(WatchKey::Admin(token.to_string()), move || {
        tokio::spawn(async move {
            match identity.sign_out(&expired).await {
                Ok(()) => tracing::info!("Administrator signed out after inactivity"),
                Err(e) => tracing::warn!("Inactivity sign-out failed: {}", e),
            }
        });
    });
}

/// Sign out an expired administrator and leave the notice for the login page.
pub async fn expire_admin(state: &AppState, session: &Session, token: &str) -> Result<(), AppError> {
    state.activity.disarm(&WatchKey::Admin(token.to_string()));
    if let Err(e) = state.identity.sign_out(token).await {
        tracing::warn!("Inactivity sign-out failed: {}", e);
    }
    session::clear_admin_token(session).await?;
    session::set_notice(session, SESSION_EXPIRED_NOTICE).await?;
    tracing::info!("Administrator session expired after inactivity");
    Ok(())
}

/// Record activity of the signed-in administrator, if any.
pub async fn record_admin_activity(
    state: &AppState,
    session: &Session,
    kind: ActivityKind,
) -> Result<WatchStatus, AppError> {
    let Some(token) = session::admin_token(session).await? else {
        return Ok(WatchStatus::Inactive);
    };

    let status = state
        .activity
        .touch(&WatchKey::Admin(token.clone()), kind)
        .for_armed_key();
    if status == WatchStatus::Expired {
        expire_admin(state, session, &token).await?;
    }
    Ok(status)
}

/// Decide whether this browser may see admin content.
///
/// `activity` counts the request itself as user activity when set.
#[tracing::instrument(skip(state, session))]
pub async fn resolve_admin(
    state: &AppState,
    session: &Session,
    activity: Option<ActivityKind>,
) -> Result<GateOutcome, AppError> {
    let Some(token) = session::admin_token(session).await? else {
        return Ok(GateOutcome::Redirect);
    };

    let key = WatchKey::Admin(token.clone());
    // every stored token had its watchdog armed at sign-in
    let watchdog = match activity {
        Some(kind) => state.activity.touch(&key, kind),
        None => state.activity.status(&key),
    }
    .for_armed_key();
    if watchdog == WatchStatus::Expired {
        expire_admin(state, session, &token).await?;
        return Ok(GateOutcome::Expired);
    }

    let mut gate = AuthGate::new();
    let auth = match state.identity.auth_state(&token).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!("Could not resolve administrator auth state: {}", e);
            return Ok(GateOutcome::Wait);
        },
    };

    let user = auth.borrow().clone();
    gate.on_auth_state_changed(user);

    match gate.decision() {
        GateDecision::Render(user) => Ok(GateOutcome::Admitted(CurrentAdmin { user, token, auth })),
        GateDecision::Redirect(_) => {
            state.activity.disarm(&key);
            session::clear_admin_token(session).await?;
            Ok(GateOutcome::Redirect)
        },
        GateDecision::Wait => Ok(GateOutcome::Wait),
    }
}

/// Gate for admin HTML pages. Navigation counts as activity.
pub async fn require_admin_page(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_admin(&state, &session, Some(ActivityKind::Click)).await {
        Ok(GateOutcome::Admitted(admin)) => {
            request.extensions_mut().insert(admin);
            next.run(request).await
        },
        Ok(GateOutcome::Expired | GateOutcome::Redirect) => Redirect::to(LOGIN_PATH).into_response(),
        Ok(GateOutcome::Wait) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Gate for the admin JSON API. Writes count as activity; reads and live
/// streams do not.
pub async fn require_admin_api(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let activity = (request.method() != Method::GET).then_some(ActivityKind::Click);

    match resolve_admin(&state, &session, activity).await {
        Ok(GateOutcome::Admitted(admin)) => {
            request.extensions_mut().insert(admin);
            next.run(request).await
        },
        Ok(GateOutcome::Expired) => ErrorResponse::with_details(
            "UNAUTHORIZED",
            SESSION_EXPIRED_NOTICE,
            json!({ "redirect": LOGIN_PATH }),
        )
        .into_response_with(StatusCode::UNAUTHORIZED),
        Ok(GateOutcome::Redirect) => ErrorResponse::with_details(
            "UNAUTHORIZED",
            "Authentication required.",
            json!({ "redirect": LOGIN_PATH }),
        )
        .into_response_with(StatusCode::UNAUTHORIZED),
        Ok(GateOutcome::Wait) => {
            ErrorResponse::new("SERVICE_UNAVAILABLE", "Identity service unavailable.")
                .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
        },
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminAccount;
    use crate::identity::local::{test_hash, LocalIdentity};
    use crate::session::test_session;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn admin() -> AdminUser {
        AdminUser {
            uid: "local:admin@school.edu".to_string(),
            email: "admin@school.edu".to_string(),
        }
    }

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LocalIdentity::new(&[AdminAccount {
                email: "admin@school.edu".to_string(),
                password_hash: test_hash("secret"),
            }])),
            Duration::from_secs(600),
        )
    }

    async fn signed_in(state: &AppState) -> (Session, String) {
        let session = test_session();
        let auth = state
            .identity
            .sign_in("admin@school.edu", "secret")
            .await
            .unwrap();
        session::set_admin_token(&session, &auth.token).await.unwrap();
        arm_admin_watchdog(state, &auth.token);
        (session, auth.token)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_gate_starts_checking_and_waits() {
        let gate = AuthGate::new();
        assert_eq!(gate.state(), &AuthState::Checking);
        assert_eq!(gate.decision(), GateDecision::Wait);
    }

    #[test]
    fn test_gate_transitions() {
        let mut gate = AuthGate::new();
        assert_eq!(gate.on_auth_state_changed(Some(admin())), WatchdogAction::Start);
        assert_eq!(gate.decision(), GateDecision::Render(admin()));
        assert_eq!(gate.on_auth_state_changed(Some(admin())), WatchdogAction::Keep);

        assert_eq!(gate.on_auth_state_changed(None), WatchdogAction::Stop);
        assert_eq!(gate.decision(), GateDecision::Redirect(LOGIN_PATH));
        assert_eq!(gate.on_auth_state_changed(None), WatchdogAction::Keep);
        assert_ne!(gate.state(), &AuthState::Checking);
    }

    #[tokio::test]
    async fn test_no_token_redirects() {
        let state = state();
        let outcome = resolve_admin(&state, &test_session(), None).await.unwrap();
        assert!(matches!(outcome, GateOutcome::Redirect));
    }

    #[tokio::test]
    async fn test_signed_in_admin_is_admitted() {
        let state = state();
        let (session, token) = signed_in(&state).await;

        match resolve_admin(&state, &session, Some(ActivityKind::Click)).await.unwrap() {
            GateOutcome::Admitted(current) => {
                assert_eq!(current.user, admin());
                assert_eq!(current.token, token);
            },
            other => panic!("expected admission, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_revoked_token_is_cleared() {
        let state = state();
        let (session, token) = signed_in(&state).await;
        state.identity.sign_out(&token).await.unwrap();

        let outcome = resolve_admin(&state, &session, None).await.unwrap();
        assert!(matches!(outcome, GateOutcome::Redirect));
        assert!(session::admin_token(&session).await.unwrap().is_none());
        assert_eq!(
            state.activity.status(&WatchKey::Admin(token)),
            WatchStatus::Inactive
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactivity_signs_out_with_notice() {
        let state = state();
        let (session, token) = signed_in(&state).await;
        let auth = state.identity.auth_state(&token).await.unwrap();

        tokio::time::advance(Duration::from_secs(601)).await;
        settle().await;

        // the watchdog signed the token out on its own and left the monitor
        assert!(auth.borrow().is_none());
        assert_eq!(state.activity.watched(), 0);

        let outcome = resolve_admin(&state, &session, Some(ActivityKind::Click))
            .await
            .unwrap();
        assert!(matches!(outcome, GateOutcome::Expired));
        assert!(session::admin_token(&session).await.unwrap().is_none());
        assert_eq!(
            session::take_notice(&session).await.unwrap().as_deref(),
            Some(SESSION_EXPIRED_NOTICE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_keeps_admin_signed_in() {
        let state = state();
        let (session, _) = signed_in(&state).await;

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(500)).await;
            settle().await;
            assert_eq!(
                record_admin_activity(&state, &session, ActivityKind::PointerMove)
                    .await
                    .unwrap(),
                WatchStatus::Active
            );
        }

        let outcome = resolve_admin(&state, &session, None).await.unwrap();
        assert!(matches!(outcome, GateOutcome::Admitted(_)));
    }
}
