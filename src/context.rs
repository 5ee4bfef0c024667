//! Application Context
//!
//! Shares the synchronizer with every component and turns user intents
//! into spawned requests.

use leptos::prelude::*;
use leptos::task::spawn_local;
use optimistic_list::{HttpCollectionClient, Outcome, Synchronizer, User};
use std::future::Future;

pub type UserSync = Synchronizer<User, HttpCollectionClient<User>>;

/// The edit applied by the Update button
pub fn exclaim(user: &User) -> User {
    User::new(user.id, format!("{}!", user.name))
}

/// App-wide handle provided via context
#[derive(Clone, Copy)]
pub struct UsersContext {
    sync: StoredValue<UserSync, LocalStorage>,
}

impl UsersContext {
    pub fn new(sync: UserSync) -> Self {
        Self {
            sync: StoredValue::new_local(sync),
        }
    }

    /// Start an operation now and let its response settle in the background
    fn dispatch<F>(&self, action: &'static str, start: impl FnOnce(&UserSync) -> F)
    where
        F: Future<Output = Outcome> + 'static,
    {
        let Some(pending) = self.sync.try_with_value(start) else {
            return;
        };
        spawn_local(async move {
            match pending.await {
                Outcome::RolledBack(err) | Outcome::Failed(err) => {
                    let _ = rolling_logger::warn(&format!("{} failed: {}", action, err));
                }
                outcome => log::debug!("[UI] {} -> {:?}", action, outcome),
            }
        });
    }

    /// Fetch the list from the server (aborts a fetch still running)
    pub fn reload(&self) {
        self.dispatch("load", |sync| sync.load());
    }

    pub fn add(&self, name: String) {
        self.dispatch("add", move |sync| sync.add(User::draft(name)));
    }

    pub fn update(&self, user: User) {
        self.dispatch("update", move |sync| sync.update(&user, exclaim));
    }

    pub fn remove(&self, user: User) {
        self.dispatch("remove", move |sync| sync.remove(&user));
    }

    /// Abort everything in flight; called when the app unmounts
    pub fn teardown(&self) {
        self.sync.try_with_value(|sync| sync.teardown());
    }
}

pub fn use_users_context() -> UsersContext {
    expect_context::<UsersContext>()
}
