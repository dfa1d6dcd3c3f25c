//! Public backend settings shared by the server shell and the browser.
//!
//! SYSTEM CONTEXT
//! ==============
//! The host reads `SUPABASE_URL` and `SUPABASE_ANON_KEY` from its environment
//! and hands them to the SSR shell through Leptos context. The shell writes
//! them into `<meta>` tags; after hydration the browser reads them back.
//! Both values are public by design of the backend (row-level security
//! protects the data), so nothing secret travels this way.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use leptos::prelude::*;
use serde::{Deserialize, Serialize};

pub const URL_META: &str = "eatin:supabase-url";
pub const ANON_KEY_META: &str = "eatin:supabase-anon-key";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicConfig {
    /// Project base URL without trailing slash, e.g. `https://xyz.supabase.co`.
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl PublicConfig {
    #[must_use]
    pub fn new(supabase_url: &str, supabase_anon_key: &str) -> Self {
        Self {
            supabase_url: normalize_base_url(supabase_url),
            supabase_anon_key: supabase_anon_key.trim().to_owned(),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Settings for the current render: the `<meta>` tags in the browser,
    /// the host-provided context on the server.
    pub fn load() -> Self {
        #[cfg(feature = "hydrate")]
        {
            Self::from_document()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            use_context::<Self>().unwrap_or_default()
        }
    }

    #[cfg(feature = "hydrate")]
    fn from_document() -> Self {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("no document; backend settings unavailable");
            return Self::default();
        };
        let read = |name: &str| {
            document
                .query_selector(&format!("meta[name=\"{name}\"]"))
                .ok()
                .flatten()
                .and_then(|el| el.get_attribute("content"))
                .unwrap_or_default()
        };
        let config = Self::new(&read(URL_META), &read(ANON_KEY_META));
        if !config.is_configured() {
            log::error!("backend settings missing from page; sign-in will fail");
        }
        config
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

/// `<meta>` tags carrying the settings into the browser.
#[component]
pub fn ConfigMeta() -> impl IntoView {
    let config = use_context::<PublicConfig>().unwrap_or_default();
    view! {
        <meta name=URL_META content=config.supabase_url/>
        <meta name=ANON_KEY_META content=config.supabase_anon_key/>
    }
}
