//! Optimistic List
//!
//! Keeps an in-memory ordered list of records in step with a remote REST
//! collection. Local mutations are applied immediately and rolled back when
//! the remote store rejects them.
//!
//! Layers:
//! - record: the `Record` contract and the `User` entity
//! - client: the `CollectionClient` abstraction and its reqwest implementation
//! - state: the list entries, error slot and loading flag
//! - synchronizer: optimistic add/update/remove with rollback and teardown

mod client;
mod config;
mod error;
mod http;
mod record;
mod state;
mod synchronizer;

#[cfg(test)]
mod tests;

pub use client::CollectionClient;
pub use config::ApiConfig;
pub use error::{SyncError, SyncResult};
pub use http::HttpCollectionClient;
pub use record::{Record, RecordId, User};
pub use state::{CorrelationId, Entry, ListState};
pub use synchronizer::{Outcome, Synchronizer};
