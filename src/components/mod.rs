//! UI Components
//!
//! Reusable Leptos components.

mod delete_confirm_button;
mod error_banner;
mod new_user_form;
mod user_list;
mod user_row;

pub use delete_confirm_button::DeleteConfirmButton;
pub use error_banner::ErrorBanner;
pub use new_user_form::NewUserForm;
pub use user_list::UserList;
pub use user_row::UserRowView;
