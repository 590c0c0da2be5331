//! MyGrade Server Library
//!
//! Web application for publishing midterm grades to students.
//!
//! # Overview
//!
//! - **Public lookup**: a student enters their name and ID number and gets
//!   their midterm grade; a match opens a per-browser breakdown view that
//!   closes itself after ten minutes without interaction.
//! - **Administration**: signed-in administrators manage classes, upload
//!   grade spreadsheets, edit or delete individual rows, and watch a live
//!   dashboard. The admin session also expires after ten minutes of
//!   inactivity.
//!
//! # Architecture
//!
//! Backends are traits injected through [`api::AppState`]:
//!
//! - [`store::DocumentStore`]: collection-oriented document database with
//!   live [`store::Subscription`]s (in-memory or PostgreSQL JSONB)
//! - [`identity::IdentityProvider`]: administrator identity service (local
//!   accounts or Firebase Auth)
//!
//! The JSON API lives in [`features`] as vertical slices of commands,
//! queries and routes; server-rendered pages live in [`web`].
//!
//! # Example
//!
//! ```no_run
//! use mygrade_server::{api, config::Config, identity::LocalIdentity, store::MemoryStore};
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let state = api::AppState::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(LocalIdentity::new(&config.identity.admin_accounts)),
//!         Duration::from_secs(config.session.inactivity_timeout_secs),
//!     );
//!     let app = api::create_router(state, &config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod identity;
pub mod middleware;
pub mod session;
pub mod store;
pub mod web;

// Re-export commonly used types
pub use error::{AppError, AppResult};
