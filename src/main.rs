//! User List Frontend Entry Point

mod app;
mod components;
mod config;
mod context;
mod store;

use app::App;
use leptos::prelude::*;
use rolling_logger::{LevelFilter, LoggerConfig};

fn console_line(line: &str) {
    web_sys::console::log_1(&line.into());
}

fn main() {
    console_error_panic_hook::set_once();

    let logger = LoggerConfig::new("UserList")
        .with_level(LevelFilter::DEBUG)
        .with_mirror(console_line);
    if let Err(e) = rolling_logger::init_logger(logger) {
        web_sys::console::warn_1(&format!("Logger disabled: {}", e).into());
    }

    mount_to_body(App);
}
