//! User List Component

use leptos::prelude::*;

use crate::components::UserRowView;
use crate::store::{use_users_store, UsersStateStoreFields};

/// All users in display order
#[component]
pub fn UserList() -> impl IntoView {
    let store = use_users_store();

    view! {
        <ul class="list-group">
            <For
                each=move || store.users().get()
                key=|row| {
                    // Placeholders share id 0; the correlation keeps them apart
                    (row.user.id, row.correlation, row.user.name.clone())
                }
                children=move |row| view! { <UserRowView row=row /> }
            />
        </ul>
    }
}
