//! # client
//!
//! Leptos + WASM frontend for the eatin restaurant diary.
//!
//! The `diary` crate decides what the UI does; this crate binds it to
//! reactive signals, renders the three pages, and talks to the hosted
//! backend (Supabase) from the browser. Server builds (`ssr`) render the
//! same components without network access.

#![recursion_limit = "256"]

pub mod app;
pub mod components;
pub mod config;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// Browser entry point: install logging and hydrate the server-rendered page.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&"console logger already installed".into());
    }
    log::info!("hydrating eatin");
    leptos::mount::hydrate_body(app::App);
}
