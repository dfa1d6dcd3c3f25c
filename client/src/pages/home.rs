//! Entry page (`/`). Has no content of its own: the route guard forwards
//! signed-in users to the dashboard and everyone else to sign-in, showing
//! "Loading..." meanwhile.

use diary::Page;
use leptos::prelude::*;

use crate::util::guard::RouteGuard;

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <RouteGuard page=Page::Entry>
            <div class="page-status">
                <p>"Loading..."</p>
            </div>
        </RouteGuard>
    }
}
