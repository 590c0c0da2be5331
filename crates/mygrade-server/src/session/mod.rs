//! Per-browser session state
//!
//! Each browser gets a cookie-backed `tower-sessions` session. It carries:
//!
//! - `studentRecord` - the student snapshot saved by a successful lookup
//! - `adminToken` - the identity token of a signed-in administrator
//! - `viewerWatch` - key of the inactivity watchdog guarding the snapshot
//! - `notice` - a one-shot message shown on the next page (e.g. expiry)

pub mod snapshot;
pub mod store;
pub mod watchdog;

use tower_sessions::{
    cookie::SameSite, session::Error as SessionError, Expiry, Session, SessionManagerLayer,
};
use uuid::Uuid;

use crate::config::SessionConfig;

pub use snapshot::{SnapshotError, SnapshotStore, STUDENT_RECORD_KEY};
pub use store::SessionMemory;
pub use watchdog::{ActivityKind, InactivityMonitor, InactivityWatchdog, WatchKey, WatchStatus};

pub const ADMIN_TOKEN_KEY: &str = "adminToken";
pub const VIEWER_WATCH_KEY: &str = "viewerWatch";
pub const NOTICE_KEY: &str = "notice";

/// Idle lifetime of the session cookie itself. The inactivity watchdogs
/// expire much sooner; the cookie must outlive them so the expiry notice can
/// still be delivered.
const COOKIE_IDLE_HOURS: i64 = 12;

pub type SessionResult<T> = Result<T, SessionError>;

/// How often expired session records are dropped
pub const SESSION_PRUNE_PERIOD: std::time::Duration = std::time::Duration::from_secs(15 * 60);

pub fn session_layer(
    config: &SessionConfig,
    store: SessionMemory,
) -> SessionManagerLayer<SessionMemory> {
    SessionManagerLayer::new(store)
        .with_name("mygrade.sid")
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(COOKIE_IDLE_HOURS)))
}

pub async fn admin_token(session: &Session) -> SessionResult<Option<String>> {
    session.get::<String>(ADMIN_TOKEN_KEY).await
}

pub async fn set_admin_token(session: &Session, token: &str) -> SessionResult<()> {
    // New privilege level, new session ID.
    session.cycle_id().await?;
    session.insert(ADMIN_TOKEN_KEY, token).await
}

pub async fn clear_admin_token(session: &Session) -> SessionResult<Option<String>> {
    session.remove::<String>(ADMIN_TOKEN_KEY).await
}

pub async fn set_notice(session: &Session, notice: &str) -> SessionResult<()> {
    session.insert(NOTICE_KEY, notice).await
}

/// Read and clear the pending notice.
pub async fn take_notice(session: &Session) -> SessionResult<Option<String>> {
    session.remove::<String>(NOTICE_KEY).await
}

/// Watchdog key of this browser's student view, created on first use.
pub async fn viewer_key(session: &Session) -> SessionResult<String> {
    if let Some(key) = session.get::<String>(VIEWER_WATCH_KEY).await? {
        return Ok(key);
    }
    let key = Uuid::new_v4().to_string();
    session.insert(VIEWER_WATCH_KEY, &key).await?;
    Ok(key)
}

pub async fn existing_viewer_key(session: &Session) -> SessionResult<Option<String>> {
    session.get::<String>(VIEWER_WATCH_KEY).await
}

#[cfg(test)]
pub(crate) fn test_session() -> Session {
    use std::sync::Arc;
    Session::new(None, Arc::new(SessionMemory::new()), None)
}
