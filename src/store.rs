//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity.
//! Filled from the synchronizer's state on every change.

use leptos::prelude::*;
use optimistic_list::{ListState, User};
use reactive_stores::Store;

/// One rendered row
#[derive(Clone, Debug, PartialEq)]
pub struct UserRow {
    pub user: User,
    /// Set while the server has not confirmed a newly added user
    pub correlation: Option<u64>,
}

impl UserRow {
    pub fn is_pending(&self) -> bool {
        self.correlation.is_some()
    }
}

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct UsersState {
    /// Users in display order, placeholders included
    pub users: Vec<UserRow>,
    /// Most recent failure message
    pub error: Option<String>,
    /// Initial fetch still running
    pub loading: bool,
}

/// Type alias for the store
pub type UsersStore = Store<UsersState>;

/// Get the users store from context
pub fn use_users_store() -> UsersStore {
    expect_context::<UsersStore>()
}

// ========================
// Store Helper Functions
// ========================

/// Copy a synchronizer state into the store, touching only changed fields
pub fn store_apply(store: &UsersStore, state: &ListState<User>) {
    let rows: Vec<UserRow> = state
        .entries()
        .iter()
        .map(|entry| UserRow {
            user: entry.record().clone(),
            correlation: entry.correlation().map(|c| c.0),
        })
        .collect();

    if store.users().with_untracked(|current| *current != rows) {
        store.users().set(rows);
    }

    let error = state.last_error().map(str::to_string);
    if store.error().with_untracked(|current| *current != error) {
        store.error().set(error);
    }

    if store.loading().get_untracked() != state.is_loading() {
        store.loading().set(state.is_loading());
    }
}
