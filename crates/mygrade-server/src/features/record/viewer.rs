//! Lifecycle of a student's saved record view
//!
//! A successful lookup saves the snapshot in the session and arms a viewer
//! watchdog. Leaving the view clears both. When the watchdog fires it leaves
//! the monitor; the snapshot still in the session marks the view as expired,
//! and it is dropped on the next request from that browser, which is then
//! sent back to the lookup form.

use mygrade_common::student::StudentSnapshot;
use tower_sessions::Session;

use crate::api::AppState;
use crate::session::{self, ActivityKind, SnapshotError, SnapshotStore, WatchKey, WatchStatus};

/// Save `snapshot` for this browser and start the inactivity watchdog.
pub async fn open(
    state: &AppState,
    session: &Session,
    snapshot: &StudentSnapshot,
) -> Result<(), SnapshotError> {
    SnapshotStore::new(session.clone()).save(snapshot).await?;

    let key = session::viewer_key(session).await?;
    let expired = key.clone();
    state.activity.arm(WatchKey::Viewer(key), move || {
        tracing::info!(viewer = %expired, "Student record view expired after inactivity");
    });
    Ok(())
}

/// Drop the snapshot and stop watching this browser.
pub async fn close(state: &AppState, session: &Session) -> Result<(), SnapshotError> {
    SnapshotStore::new(session.clone()).clear().await?;
    if let Some(key) = session::existing_viewer_key(session).await? {
        state.activity.disarm(&WatchKey::Viewer(key));
    }
    Ok(())
}

/// Record activity on the view. An expired view is closed.
pub async fn touch(
    state: &AppState,
    session: &Session,
    kind: ActivityKind,
) -> Result<WatchStatus, SnapshotError> {
    let Some(key) = session::existing_viewer_key(session).await? else {
        return Ok(WatchStatus::Inactive);
    };

    let mut status = state.activity.touch(&WatchKey::Viewer(key), kind);
    // an open view always has a watchdog until it fires
    if status == WatchStatus::Inactive && SnapshotStore::new(session.clone()).is_saved().await? {
        status = status.for_armed_key();
    }
    if status == WatchStatus::Expired {
        close(state, session).await?;
    }
    Ok(status)
}

/// The snapshot to display, if the view is still open.
pub async fn current(
    state: &AppState,
    session: &Session,
    kind: ActivityKind,
) -> Result<Option<StudentSnapshot>, SnapshotError> {
    let status = touch(state, session, kind).await?;
    if status == WatchStatus::Expired {
        return Ok(None);
    }

    let snapshot = SnapshotStore::new(session.clone()).load().await?;
    if snapshot.is_none() {
        close(state, session).await?;
    }
    Ok(snapshot)
}
