//! User List App
//!
//! Root component: wires the synchronizer to the store, loads on mount and
//! tears down on unmount.

use leptos::prelude::*;
use optimistic_list::{HttpCollectionClient, Synchronizer, User};
use reactive_stores::Store;

use crate::components::{ErrorBanner, NewUserForm, UserList};
use crate::config::api_config;
use crate::context::UsersContext;
use crate::store::{store_apply, UsersState, UsersStateStoreFields};

#[component]
pub fn App() -> impl IntoView {
    let store = Store::new(UsersState::default());
    provide_context(store);

    let client = match HttpCollectionClient::<User>::new(api_config()) {
        Ok(client) => client,
        Err(e) => {
            let _ = rolling_logger::error(&format!("HTTP client unavailable: {}", e));
            return view! { <p class="text-danger">{e.to_string()}</p> }.into_any();
        }
    };

    let sync = Synchronizer::new(client);
    sync.subscribe(move |state| store_apply(&store, state));

    let ctx = UsersContext::new(sync);
    provide_context(ctx);

    let _ = rolling_logger::info("Mounted, loading users");
    ctx.reload();
    on_cleanup(move || ctx.teardown());

    view! {
        <div class="user-list-app">
            <h1>"Users"</h1>

            <ErrorBanner />

            <NewUserForm />

            <Show when=move || store.loading().get()>
                <p class="loading">"Loading..."</p>
            </Show>

            <UserList />

            <p class="user-count">{move || format!("{} users", store.users().read().len())}</p>
        </div>
    }
    .into_any()
}
