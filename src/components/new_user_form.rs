//! New User Form Component
//!
//! Text input + Add button. The user shows up at the top of the list
//! immediately and is swapped for the saved one when the server answers.

use leptos::prelude::*;

use crate::context::use_users_context;

#[component]
pub fn NewUserForm() -> impl IntoView {
    let ctx = use_users_context();
    let (new_name, set_new_name) = signal(String::new());

    let on_add = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let name = new_name.get().trim().to_string();
        if name.is_empty() { return; }

        ctx.add(name);
        set_new_name.set(String::new());
    };

    view! {
        <form class="new-user-form" on:submit=on_add>
            <input
                type="text"
                placeholder="New user name..."
                prop:value=move || new_name.get()
                on:input=move |ev| set_new_name.set(event_target_value(&ev))
            />
            <button type="submit" class="btn btn-primary mb-3">"Add"</button>
        </form>
    }
}
