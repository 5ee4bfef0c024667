//! Delete Confirm Button Component
//!
//! Two-step delete: the first click arms the button, the second one
//! (on the check mark) runs the callback. Clicks never reach the row.

use leptos::prelude::*;

#[component]
pub fn DeleteConfirmButton(
    #[prop(into)] button_class: String,
    #[prop(into)] on_confirm: Callback<()>,
    #[prop(optional)] disabled: bool,
) -> impl IntoView {
    let armed = RwSignal::new(false);

    move || {
        if armed.get() {
            view! {
                <span class="delete-confirm">
                    <span class="delete-confirm-text">"Delete?"</span>
                    <button class="confirm-btn" on:click=move |ev| {
                        ev.stop_propagation();
                        armed.set(false);
                        on_confirm.run(());
                    }>"✓"</button>
                    <button class="cancel-btn" on:click=move |ev| {
                        ev.stop_propagation();
                        armed.set(false);
                    }>"✗"</button>
                </span>
            }
            .into_any()
        } else {
            view! {
                <button
                    class=button_class.clone()
                    disabled=disabled
                    on:click=move |ev| {
                        ev.stop_propagation();
                        armed.set(true);
                    }
                >
                    "Delete"
                </button>
            }
            .into_any()
        }
    }
}
