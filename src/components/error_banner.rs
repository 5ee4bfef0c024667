//! Error Banner Component

use leptos::prelude::*;

use crate::store::{use_users_store, UsersStateStoreFields};

/// Shows the most recent failure, if any
#[component]
pub fn ErrorBanner() -> impl IntoView {
    let store = use_users_store();

    view! {
        {move || store.error().get().map(|message| view! {
            <p class="text-danger">{message}</p>
        })}
    }
}
