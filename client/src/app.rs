//! Root application component with routing and context providers.

use std::sync::Arc;

use diary::{AuthGateway, VisitRepository};
use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::config::{ConfigMeta, PublicConfig};
use crate::net::auth::SupabaseAuth;
use crate::net::visits::SupabaseVisits;
use crate::pages::{auth::AuthPage, dashboard::DashboardPage, home::HomePage};
use crate::state::session::install_session;

/// HTML shell rendered on the server for SSR + hydration.
///
/// Expects the host to provide `PublicConfig` as context for the request.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <ConfigMeta/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Backend handles shared by every page.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthGateway>,
    pub visits: Arc<dyn VisitRepository>,
}

impl Services {
    /// Supabase-backed services for `config`.
    pub fn supabase(config: PublicConfig) -> Self {
        let auth = SupabaseAuth::new(config);
        let visits = SupabaseVisits::new(auth.clone());
        Self { auth: Arc::new(auth), visits: Arc::new(visits) }
    }
}

/// Services provided by `App`.
pub fn use_services() -> Services {
    expect_context::<Services>()
}

/// Root application component.
///
/// Builds the backend services, installs the one session store, and sets up
/// client-side routing. Tests and alternative hosts may provide their own
/// `Services` as context before rendering.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let services = use_context::<Services>().unwrap_or_else(|| Services::supabase(PublicConfig::load()));
    provide_context(services.clone());
    install_session(services.auth);

    view! {
        <Stylesheet id="leptos" href="/pkg/eatin.css"/>
        <Title text="eatin"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=StaticSegment("") view=HomePage/>
                <Route path=StaticSegment("auth") view=AuthPage/>
                <Route path=StaticSegment("dashboard") view=DashboardPage/>
            </Routes>
        </Router>
    }
}
