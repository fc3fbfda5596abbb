//! HTTP client SDK for the envmon environmental-monitoring platform.
//!
//! This crate provides a typed client for the envmon REST API with
//! bearer-token sessions that refresh themselves.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use envmon_client::{EnvmonClient, Result, SessionEvent, SessionStore};
//!
//! # async fn example() -> Result<()> {
//! // Sessions persist across runs when backed by a file.
//! let session = Arc::new(SessionStore::open_file(std::path::Path::new("/tmp/envmon")));
//!
//! let client = EnvmonClient::builder()
//!     .base_url("http://localhost:8000/api/")
//!     .session(session)
//!     .build()?;
//!
//! // React to forced logouts in one place.
//! let mut events = client.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if event == SessionEvent::Expired {
//!             eprintln!("Session expired, please log in again");
//!         }
//!     }
//! });
//!
//! client.auth().login("ana", "secret").await?;
//!
//! for zone in client.zones().list().await? {
//!     println!("{} {}", zone.id, zone.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Session handling
//!
//! Every authenticated call attaches the stored access token. When the
//! server answers 401 the client refreshes the token once, shared by every
//! call that is waiting on it, and replays the call. If the refresh fails,
//! or the replayed call is rejected again, the session is cleared and the
//! call fails with [`Error::SessionExpired`].
//!
//! # API Coverage
//!
//! - **Auth**: login, registration, current user, password recovery
//! - **Zones**, **Stations**, **Sensors**: CRUD plus nested listings
//! - **Readings**: filtered listing, statistics, CSV report download
//! - **Alerts**: filtered listing, attend, statistics
//! - **Reports**: CRUD, report details, generated report files
//! - **Users**, **Roles**: CRUD and role assignment

pub mod api;
pub mod client;
pub mod error;
mod refresh;
pub mod session;
pub mod types;

pub use client::{ApiRequest, ClientBuilder, DEFAULT_BASE_URL, EnvmonClient};
pub use error::{Error, RefreshFailure, Result};
pub use session::{
    FileSessionStorage, MemorySessionStorage, SessionEvent, SessionPersistence, SessionStatus,
    SessionStore, SharedSessionStore,
};
pub use types::*;

// Re-export API types that are commonly used with query methods
pub use api::{AlertFilters, DateRange, ReadingFilters, ReadingsApi};
