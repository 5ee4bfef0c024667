//! Optimistic List Synchronizer
//!
//! Mirrors a remote collection in memory. Every mutating call changes the
//! local list before it returns and hands back a future that performs the
//! request; a rejected request restores the list as it was before the call
//! and records the error message.
//!
//! The synchronizer runs on a single thread (browser event loop or a
//! current-thread runtime). State lives behind `RefCell` and no borrow is
//! held across an await.

use futures::future::{AbortHandle, AbortRegistration, Abortable, Aborted, LocalBoxFuture};
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::client::CollectionClient;
use crate::error::{SyncError, SyncResult};
use crate::record::Record;
use crate::state::{CorrelationId, Entry, ListState};

/// How one operation ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The server accepted the request
    Confirmed,
    /// The request failed and its optimistic change was undone
    RolledBack(SyncError),
    /// Nothing to undo: a failed load, or a call refused before any
    /// request was sent
    Failed(SyncError),
    /// Aborted by teardown or by a newer load; state untouched
    Cancelled,
}

type Listener<R> = Rc<dyn Fn(&ListState<R>)>;

struct Inner<R, C> {
    client: C,
    state: RefCell<ListState<R>>,
    listeners: RefCell<Vec<Listener<R>>>,
    /// The single in-flight list fetch (op id, abort handle)
    load: RefCell<Option<(u64, AbortHandle)>>,
    /// In-flight add/update/remove requests by op id
    in_flight: RefCell<HashMap<u64, AbortHandle>>,
    next_op: Cell<u64>,
    next_correlation: Cell<u64>,
    torn_down: Cell<bool>,
}

impl<R: Record, C> Inner<R, C> {
    fn next_op(&self) -> u64 {
        let op = self.next_op.get() + 1;
        self.next_op.set(op);
        op
    }

    fn next_correlation(&self) -> CorrelationId {
        let id = self.next_correlation.get() + 1;
        self.next_correlation.set(id);
        CorrelationId(id)
    }

    /// Change the state, then tell every listener
    fn mutate<T>(&self, f: impl FnOnce(&mut ListState<R>) -> T) -> T {
        let result = f(&mut self.state.borrow_mut());
        self.notify();
        result
    }

    fn notify(&self) {
        if self.torn_down.get() {
            return;
        }
        // Listeners may call back into the synchronizer
        let state = self.state.borrow().clone();
        let listeners: Vec<Listener<R>> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&state);
        }
    }

    /// Apply the result of an add/update/remove request
    fn settle<T>(
        &self,
        action: &str,
        result: Result<SyncResult<T>, Aborted>,
        snapshot: Vec<Entry<R>>,
        on_success: impl FnOnce(&Self, T),
    ) -> Outcome {
        match result {
            Err(Aborted) => Outcome::Cancelled,
            Ok(_) if self.torn_down.get() => Outcome::Cancelled,
            Ok(Err(err)) if err.is_cancelled() => Outcome::Cancelled,
            Ok(Ok(value)) => {
                on_success(self, value);
                Outcome::Confirmed
            }
            Ok(Err(err)) => {
                log::warn!("[SYNC] {} failed, rolling back: {}", action, err);
                self.mutate(|state| {
                    state.restore(snapshot);
                    state.set_error(err.to_string());
                });
                Outcome::RolledBack(err)
            }
        }
    }
}

/// Unregisters an in-flight request when its future ends or is dropped
struct Tracked<R: Record, C> {
    inner: Rc<Inner<R, C>>,
    op: u64,
}

impl<R: Record, C> Drop for Tracked<R, C> {
    fn drop(&mut self) {
        self.inner.in_flight.borrow_mut().remove(&self.op);
        let mut load = self.inner.load.borrow_mut();
        if matches!(*load, Some((op, _)) if op == self.op) {
            *load = None;
        }
    }
}

/// Optimistic list over a remote collection.
///
/// Cloning is cheap and shares the same list.
pub struct Synchronizer<R, C> {
    inner: Rc<Inner<R, C>>,
}

impl<R, C> Clone for Synchronizer<R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R, C> Synchronizer<R, C>
where
    R: Record,
    C: CollectionClient<R> + 'static,
{
    /// Create an empty list bound to `client`
    pub fn new(client: C) -> Self {
        Self {
            inner: Rc::new(Inner {
                client,
                state: RefCell::new(ListState::new()),
                listeners: RefCell::new(Vec::new()),
                load: RefCell::new(None),
                in_flight: RefCell::new(HashMap::new()),
                next_op: Cell::new(0),
                next_correlation: Cell::new(0),
                torn_down: Cell::new(false),
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.inner.client
    }

    /// Register a listener; it is called right away and after every change
    pub fn subscribe(&self, listener: impl Fn(&ListState<R>) + 'static) {
        if self.inner.torn_down.get() {
            return;
        }
        let listener: Listener<R> = Rc::new(listener);
        self.inner.listeners.borrow_mut().push(Rc::clone(&listener));
        let state = self.inner.state.borrow().clone();
        listener(&state);
    }

    // ========================
    // Readers
    // ========================

    pub fn state(&self) -> ListState<R> {
        self.inner.state.borrow().clone()
    }

    pub fn records(&self) -> Vec<R> {
        self.inner.state.borrow().records()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.state.borrow().last_error().map(str::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    pub fn has_load_in_flight(&self) -> bool {
        self.inner.load.borrow().is_some()
    }

    /// Number of add/update/remove requests still awaiting a response
    pub fn pending_mutations(&self) -> usize {
        self.inner.in_flight.borrow().len()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }

    // ========================
    // Operations
    // ========================

    /// Fetch the whole collection, replacing the local list on success.
    ///
    /// Aborts any fetch still in flight first, so at most one is alive.
    pub fn load(&self) -> LocalBoxFuture<'static, Outcome> {
        let inner = Rc::clone(&self.inner);
        let started = self.begin_load();

        async move {
            let Some((tracked, registration)) = started else {
                return Outcome::Cancelled;
            };
            let result = Abortable::new(inner.client.fetch_all(), registration).await;
            drop(tracked);

            match result {
                Err(Aborted) => Outcome::Cancelled,
                Ok(_) if inner.torn_down.get() => Outcome::Cancelled,
                Ok(Err(err)) if err.is_cancelled() => Outcome::Cancelled,
                Ok(Ok(records)) => {
                    log::info!("[SYNC] Loaded {} records", records.len());
                    inner.mutate(|state| {
                        state.replace_all(records);
                        state.set_loading(false);
                    });
                    Outcome::Confirmed
                }
                Ok(Err(err)) => {
                    log::warn!("[SYNC] load failed: {}", err);
                    inner.mutate(|state| {
                        state.set_error(err.to_string());
                        state.set_loading(false);
                    });
                    Outcome::Failed(err)
                }
            }
        }
        .boxed_local()
    }

    /// Prepend `candidate` now, then create it remotely.
    ///
    /// The placeholder is tagged with a correlation id and swapped for the
    /// server's record by that id, so concurrent adds cannot cross over.
    pub fn add(&self, candidate: R) -> LocalBoxFuture<'static, Outcome> {
        let inner = Rc::clone(&self.inner);
        let prepared = self.begin().map(|started| {
            let correlation = inner.next_correlation();
            let snapshot = inner.mutate(|state| {
                let snapshot = state.snapshot();
                state.prepend(Entry::pending(candidate.clone(), correlation));
                snapshot
            });
            log::debug!("[SYNC] add {:?} as {}", candidate, correlation);
            (started, correlation, snapshot)
        });

        async move {
            let Some(((tracked, registration), correlation, snapshot)) = prepared else {
                return Outcome::Cancelled;
            };
            let result = Abortable::new(inner.client.create(&candidate), registration).await;
            drop(tracked);

            inner.settle("add", result, snapshot, |inner, saved| {
                let found = inner.mutate(|state| state.confirm(correlation, saved));
                if !found {
                    log::debug!("[SYNC] placeholder {} gone before confirmation", correlation);
                }
            })
        }
        .boxed_local()
    }

    /// Replace the entry with `record`'s id by `mutation(record)` now, then
    /// send the updated record as a partial update. The server response is
    /// not merged back.
    ///
    /// A record the server has not assigned an id to yet is refused with
    /// `SyncError::Unsaved`; the list is left alone and nothing is sent.
    pub fn update(
        &self,
        record: &R,
        mutation: impl FnOnce(&R) -> R,
    ) -> LocalBoxFuture<'static, Outcome> {
        if !record.is_persisted() {
            return self.refuse_unsaved("update", record);
        }
        let inner = Rc::clone(&self.inner);
        let id = record.id();
        let updated = mutation(record);
        let prepared = self.begin().map(|started| {
            let snapshot = inner.mutate(|state| {
                let snapshot = state.snapshot();
                if !state.replace_by_id(id, updated.clone()) {
                    log::debug!("[SYNC] update of unknown id {}", id);
                }
                snapshot
            });
            (started, snapshot)
        });

        async move {
            let Some(((tracked, registration), snapshot)) = prepared else {
                return Outcome::Cancelled;
            };
            let result = Abortable::new(inner.client.update(id, &updated), registration).await;
            drop(tracked);

            inner.settle("update", result, snapshot, |_, ()| {})
        }
        .boxed_local()
    }

    /// Drop the entry with `record`'s id now, then delete it remotely.
    ///
    /// Unsaved records are refused like in [`Synchronizer::update`].
    pub fn remove(&self, record: &R) -> LocalBoxFuture<'static, Outcome> {
        if !record.is_persisted() {
            return self.refuse_unsaved("remove", record);
        }
        let inner = Rc::clone(&self.inner);
        let id = record.id();
        let prepared = self.begin().map(|started| {
            let snapshot = inner.mutate(|state| {
                let snapshot = state.snapshot();
                state.remove_by_id(id);
                snapshot
            });
            (started, snapshot)
        });

        async move {
            let Some(((tracked, registration), snapshot)) = prepared else {
                return Outcome::Cancelled;
            };
            let result = Abortable::new(inner.client.delete(id), registration).await;
            drop(tracked);

            inner.settle("remove", result, snapshot, |_, ()| {})
        }
        .boxed_local()
    }

    /// Abort every in-flight request and stop reacting to responses.
    ///
    /// Called when the owning view unmounts. Later calls resolve to
    /// `Outcome::Cancelled` without touching the list.
    pub fn teardown(&self) {
        if self.inner.torn_down.replace(true) {
            return;
        }
        let load = self.inner.load.borrow_mut().take();
        if let Some((_, handle)) = load {
            handle.abort();
        }
        let handles: Vec<AbortHandle> = self
            .inner
            .in_flight
            .borrow_mut()
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        log::debug!("[SYNC] teardown, aborting {} mutations", handles.len());
        for handle in handles {
            handle.abort();
        }
        self.inner.listeners.borrow_mut().clear();
    }

    // ========================
    // Request bookkeeping
    // ========================

    /// Placeholders all share id 0, so id-addressed calls cannot target one
    fn refuse_unsaved(&self, action: &str, record: &R) -> LocalBoxFuture<'static, Outcome> {
        let outcome = if self.inner.torn_down.get() {
            Outcome::Cancelled
        } else {
            log::warn!("[SYNC] {} refused for unsaved record {:?}", action, record);
            Outcome::Failed(SyncError::Unsaved)
        };
        futures::future::ready(outcome).boxed_local()
    }

    /// Register a mutation request, unless torn down
    fn begin(&self) -> Option<(Tracked<R, C>, AbortRegistration)> {
        if self.inner.torn_down.get() {
            return None;
        }
        let (handle, registration) = AbortHandle::new_pair();
        let op = self.inner.next_op();
        self.inner.in_flight.borrow_mut().insert(op, handle);
        Some((
            Tracked {
                inner: Rc::clone(&self.inner),
                op,
            },
            registration,
        ))
    }

    /// Replace the in-flight fetch with a new one, unless torn down
    fn begin_load(&self) -> Option<(Tracked<R, C>, AbortRegistration)> {
        if self.inner.torn_down.get() {
            return None;
        }
        let previous = self.inner.load.borrow_mut().take();
        if let Some((op, handle)) = previous {
            log::debug!("[SYNC] aborting superseded load #{}", op);
            handle.abort();
        }
        let (handle, registration) = AbortHandle::new_pair();
        let op = self.inner.next_op();
        *self.inner.load.borrow_mut() = Some((op, handle));
        self.inner.mutate(|state| state.set_loading(true));
        Some((
            Tracked {
                inner: Rc::clone(&self.inner),
                op,
            },
            registration,
        ))
    }
}
