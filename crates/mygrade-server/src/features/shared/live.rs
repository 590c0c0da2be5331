//! Server-sent event streams over live subscriptions
//!
//! Every push is a full snapshot sent as an `event: snapshot` frame with a
//! JSON payload. Store failures are reported as `event: error` frames and the
//! stream keeps waiting for the next change.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{stream, Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;

use crate::identity::{wait_for_sign_out, AuthStateReceiver};
use crate::store::{Document, StoreError, Subscription};

pub const SNAPSHOT_EVENT: &str = "snapshot";
pub const ERROR_EVENT: &str = "error";

/// Generic text of error frames
pub const STREAM_ERROR_MESSAGE: &str = "Database error.";

pub fn snapshot_event<T: Serialize>(payload: &T) -> Event {
    match Event::default().event(SNAPSHOT_EVENT).json_data(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!("Failed to encode live snapshot: {}", e);
            error_event()
        },
    }
}

pub fn error_event() -> Event {
    Event::default().event(ERROR_EVENT).data(STREAM_ERROR_MESSAGE)
}

/// Frame for one result of a subscription
pub fn frame<T: Serialize>(result: Result<T, StoreError>) -> Event {
    match result {
        Ok(payload) => snapshot_event(&payload),
        Err(e) => {
            tracing::error!("Live subscription read failed: {}", e);
            error_event()
        },
    }
}

/// Stream one collection, projecting each snapshot's documents.
pub fn collection_events<T, F>(
    subscription: Subscription,
    project: F,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static
where
    T: Serialize,
    F: Fn(Vec<Document>) -> T + Send + 'static,
{
    stream::unfold((subscription, project), |(mut subscription, project)| async move {
        let next = subscription.next().await?;
        let event = frame(next.map(|snapshot| project(snapshot.documents)));
        Some((Ok(event), (subscription, project)))
    })
}

/// Wrap an admin stream so it ends when the administrator signs out.
pub fn admin_sse<S>(
    events: S,
    auth: AuthStateReceiver,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static>
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(events.take_until(wait_for_sign_out(auth))).keep_alive(KeepAlive::default())
}
