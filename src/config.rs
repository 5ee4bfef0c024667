//! Build-time configuration
//!
//! `USER_LIST_API_URL` and `USER_LIST_COLLECTION` override the defaults
//! when set at compile time (e.g. `USER_LIST_API_URL=http://localhost:3000 trunk serve`).

use optimistic_list::ApiConfig;

pub fn api_config() -> ApiConfig {
    let config = match option_env!("USER_LIST_API_URL") {
        Some(url) => ApiConfig::new(url),
        None => ApiConfig::default(),
    };
    match option_env!("USER_LIST_COLLECTION") {
        Some(collection) => config.with_collection(collection),
        None => config,
    }
}
