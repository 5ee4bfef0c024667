//! User Row Component
//!
//! One list entry with Update and Delete actions. Unsaved users have no
//! server id yet, so both actions stay disabled until confirmation.

use leptos::prelude::*;

use crate::components::DeleteConfirmButton;
use crate::context::use_users_context;
use crate::store::UserRow;

#[component]
pub fn UserRowView(row: UserRow) -> impl IntoView {
    let ctx = use_users_context();

    let pending = row.is_pending();
    let row_class = if pending {
        "list-group-item d-flex justify-content-between align-items-center pending"
    } else {
        "list-group-item d-flex justify-content-between align-items-center"
    };
    let user = row.user;
    let name = user.name.clone();
    let user_for_update = user.clone();

    view! {
        <li class=row_class>
            <span class="user-name">{name}</span>
            <div>
                <button
                    class="btn btn-outline-secondary mx-1"
                    disabled=pending
                    on:click=move |_| ctx.update(user_for_update.clone())
                >
                    "Update"
                </button>
                <DeleteConfirmButton
                    button_class="btn btn-outline-danger"
                    disabled=pending
                    on_confirm=Callback::new(move |_| ctx.remove(user.clone()))
                />
            </div>
        </li>
    }
}
