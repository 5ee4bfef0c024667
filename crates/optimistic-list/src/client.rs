//! Collection Client - Core Trait
//!
//! Abstract interface to the remote collection.
//! Implementations can use HTTP, an in-memory fake, etc.

use async_trait::async_trait;
use std::rc::Rc;

use crate::error::SyncResult;
use crate::record::{Record, RecordId};

/// Remote CRUD operations the synchronizer relies on.
///
/// Futures are not required to be `Send`: the synchronizer runs on a
/// single event-loop thread. Dropping a returned future must abort the
/// underlying request.
#[async_trait(?Send)]
pub trait CollectionClient<R: Record> {
    /// Fetch the full collection
    async fn fetch_all(&self) -> SyncResult<Vec<R>>;

    /// Create a record; the server assigns the id
    async fn create(&self, record: &R) -> SyncResult<R>;

    /// Partially update the record with `id`
    async fn update(&self, id: RecordId, record: &R) -> SyncResult<()>;

    /// Delete the record with `id`
    async fn delete(&self, id: RecordId) -> SyncResult<()>;
}

#[async_trait(?Send)]
impl<R: Record, C: CollectionClient<R> + ?Sized> CollectionClient<R> for Rc<C> {
    async fn fetch_all(&self) -> SyncResult<Vec<R>> {
        (**self).fetch_all().await
    }

    async fn create(&self, record: &R) -> SyncResult<R> {
        (**self).create(record).await
    }

    async fn update(&self, id: RecordId, record: &R) -> SyncResult<()> {
        (**self).update(id, record).await
    }

    async fn delete(&self, id: RecordId) -> SyncResult<()> {
        (**self).delete(id).await
    }
}
