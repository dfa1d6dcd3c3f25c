//! Route guard wiring for page components.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every routed page wraps its content in `RouteGuard`, so all pages apply
//! the same redirect rules from `diary::guard`. The effect re-runs whenever
//! the session store changes and performs the navigation the guard asks for.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use diary::{GuardDecision, Page};
use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::state::session::{SessionHandle, use_session};

/// Text shown while `page` is not rendered. The entry page only ever
/// forwards, so it never claims to be redirecting.
fn placeholder(page: Page, decision: GuardDecision) -> &'static str {
    match decision {
        GuardDecision::ShowLoading => "Loading...",
        GuardDecision::Redirect(_) if page == Page::Entry => "Loading...",
        GuardDecision::Redirect(Page::Auth) => "Redirecting to sign in...",
        GuardDecision::Redirect(_) => "Redirecting...",
        GuardDecision::Render => "",
    }
}

/// Render `children` only when the session allows `page`; otherwise show a
/// placeholder and navigate where the guard says.
#[component]
pub fn RouteGuard(page: Page, children: ChildrenFn) -> impl IntoView {
    let session = use_session();
    let navigate = use_navigate();

    Effect::new(move || {
        if let Some(target) = session.decide(page).redirect() {
            log::info!("route guard: {} -> {}", page.path(), target.path());
            navigate(target.path(), NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    guarded_view(session, page, children)
}

/// The rendering half of `RouteGuard`: `children` or the placeholder.
pub(crate) fn guarded_view(session: SessionHandle, page: Page, children: ChildrenFn) -> AnyView {
    view! {
        <Show
            when=move || session.decide(page) == GuardDecision::Render
            fallback=move || {
                view! {
                    <div class="page-status">
                        <p>{move || placeholder(page, session.decide(page))}</p>
                    </div>
                }
            }
        >
            {children()}
        </Show>
    }
    .into_any()
}
