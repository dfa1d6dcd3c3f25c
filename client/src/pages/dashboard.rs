//! Dashboard page (`/dashboard`) listing the signed-in user's visits.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the authenticated landing route. It owns one `DashboardState`
//! for as long as the page is mounted, re-fetches the list whenever the
//! signed-in owner changes, and hands every write to `diary::dashboard`,
//! which sequences the repository call and the follow-up re-fetch.
//!
//! ERROR HANDLING
//! ==============
//! Failures surface as the dashboard notice; the page itself never errors.
//! Tasks that finish after the page is gone find the signal disposed and
//! stop without touching anything.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use diary::dashboard::{DashboardState, VisitStats};
use diary::Page;
use diary::model::format_iso_date;
use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;
use uuid::Uuid;

use crate::app::use_services;
use crate::components::confirm_dialog::ConfirmDialog;
use crate::components::site_header::SiteHeader;
use crate::components::visit_card::VisitCard;
use crate::components::visit_form::VisitForm;
use crate::state::dashboard::DashboardHandle;
use crate::state::session::use_session;
use crate::util::clock::today;
use crate::util::guard::RouteGuard;

fn list_description(count: usize) -> String {
    if count == 0 {
        "No visits yet. Add your first restaurant!".to_owned()
    } else {
        format!("{count} restaurants and counting")
    }
}

fn distinct_caption(stats: VisitStats) -> String {
    match stats.restaurants {
        1 => "1 distinct restaurant".to_owned(),
        n => format!("{n} distinct restaurants"),
    }
}

fn delete_prompt(restaurant: Option<&str>) -> String {
    match restaurant {
        Some(name) => format!("Delete your visit to {name}? This cannot be undone."),
        None => "Delete this visit? This cannot be undone.".to_owned(),
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    view! {
        <RouteGuard page=Page::Dashboard>
            <DashboardView/>
        </RouteGuard>
    }
}

#[component]
fn DashboardView() -> impl IntoView {
    let services = use_services();
    let session = use_session();
    let dashboard = DashboardHandle::new(today());

    // Only re-fetch when the owner actually changes, not on token refresh.
    let owner_id = Memo::new(move |_| session.identity().map(|who| who.id));
    let repo = services.visits.clone();
    Effect::new(move || {
        let Some(owner) = owner_id.get() else {
            return;
        };
        let repo = repo.clone();
        leptos::task::spawn_local(async move {
            diary::dashboard::refresh(&dashboard, &*repo, owner).await;
        });
    });

    let repo = services.visits.clone();
    let on_submit = Callback::new(move |()| {
        let repo = repo.clone();
        let owner = session.identity_untracked();
        leptos::task::spawn_local(async move {
            diary::dashboard::submit(&dashboard, &*repo, owner.as_ref(), today()).await;
        });
    });

    let on_cancel_edit = Callback::new(move |()| dashboard.update(|s| s.cancel_edit(today())));

    let on_edit = Callback::new(move |id: Uuid| {
        let mut started = false;
        dashboard.update(|s| started = s.begin_edit(id));
        if started {
            scroll_to_top();
        }
    });

    let on_delete_request = Callback::new(move |id: Uuid| {
        dashboard.update(|s| {
            if !s.request_delete(id) {
                log::debug!("delete request for {id} ignored");
            }
        });
    });
    let on_delete_cancel = Callback::new(move |()| dashboard.update(DashboardState::cancel_delete));

    let repo = services.visits.clone();
    let on_delete_confirm = Callback::new(move |()| {
        let Some(owner) = session.identity_untracked() else {
            return;
        };
        let repo = repo.clone();
        leptos::task::spawn_local(async move {
            diary::dashboard::confirm_delete(&dashboard, &*repo, owner.id, today()).await;
        });
    });

    // Sign-out finishes in a task; the navigation happens here, on the
    // reactive side, once the task reports where to go.
    let signed_out_to = RwSignal::new(None::<Page>);
    let navigate = use_navigate();
    Effect::new(move || {
        if let Some(page) = signed_out_to.get() {
            navigate(page.path(), NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });
    let auth = services.auth.clone();
    let on_sign_out = Callback::new(move |()| {
        let auth = auth.clone();
        leptos::task::spawn_local(async move {
            diary::session::sign_out(&session, &*auth, |page| {
                signed_out_to.try_set(Some(page));
            })
            .await;
        });
    });

    let email = Signal::derive(move || session.identity().map(|who| who.label()).unwrap_or_default());

    view! {
        <div class="dashboard-page">
            <SiteHeader email=email on_sign_out=on_sign_out/>
            <main class="dashboard-page__grid">
                <div class="dashboard-page__side">
                    <VisitForm
                        dashboard=dashboard
                        max_date=format_iso_date(today())
                        on_submit=on_submit
                        on_cancel=on_cancel_edit
                    />
                    <StatsCard dashboard=dashboard/>
                </div>
                <VisitList dashboard=dashboard on_edit=on_edit on_delete=on_delete_request/>
            </main>
            <DeleteDialog dashboard=dashboard on_confirm=on_delete_confirm on_cancel=on_delete_cancel/>
        </div>
    }
}

#[component]
fn StatsCard(dashboard: DashboardHandle) -> impl IntoView {
    let stats = move || dashboard.with(DashboardState::stats);

    view! {
        <section class="card stats-card">
            <h2 class="card__title">"Your Stats"</h2>
            <div class="stats-card__count">{move || stats().visits}</div>
            <div class="stats-card__label">"restaurants visited"</div>
            <div class="stats-card__distinct">{move || distinct_caption(stats())}</div>
        </section>
    }
    .into_any()
}

#[component]
fn VisitList(dashboard: DashboardHandle, on_edit: Callback<Uuid>, on_delete: Callback<Uuid>) -> impl IntoView {
    let count = move || dashboard.with(|s| s.visits.len());
    let waiting = move || dashboard.with(|s| s.loading && s.visits.is_empty());

    let cards = move || {
        let editing = dashboard.with(|s| s.editing_id);
        dashboard
            .with(|s| s.visits.clone())
            .into_iter()
            .map(|visit| {
                let active = editing == Some(visit.id);
                view! { <VisitCard visit=visit active=active on_edit=on_edit on_delete=on_delete/> }
            })
            .collect::<Vec<_>>()
    };

    let body = move || {
        if waiting() {
            view! { <p class="dashboard-page__loading">"Loading visits..."</p> }.into_any()
        } else if count() == 0 {
            view! {
                <div class="dashboard-page__empty">
                    <p>"No restaurant visits yet."</p>
                    <p>"Add your first visit to get started!"</p>
                </div>
            }
            .into_any()
        } else {
            view! { <div class="dashboard-page__cards">{cards}</div> }.into_any()
        }
    };

    view! {
        <section class="card dashboard-page__list">
            <h2 class="card__title">"Your Restaurant Visits"</h2>
            <p class="card__description">{move || list_description(count())}</p>
            {body}
        </section>
    }
    .into_any()
}

/// Confirmation for the pending delete. Stays up, reading "Deleting...",
/// until the delete finishes.
#[component]
fn DeleteDialog(dashboard: DashboardHandle, on_confirm: Callback<()>, on_cancel: Callback<()>) -> impl IntoView {
    let pending_name = move || {
        dashboard.with(|s| {
            s.pending_delete
                .and_then(|id| s.visit(id))
                .map(|visit| visit.restaurant_name.clone())
        })
    };

    view! {
        <Show when=move || dashboard.with(|s| s.pending_delete.is_some())>
            <ConfirmDialog
                title="Delete Visit"
                message=delete_prompt(pending_name().as_deref())
                confirm_label="Delete"
                busy=Signal::derive(move || dashboard.with(|s| s.deleting))
                on_confirm=on_confirm
                on_cancel=on_cancel
            />
        </Show>
    }
    .into_any()
}

#[cfg(feature = "hydrate")]
fn scroll_to_top() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let options = web_sys::ScrollToOptions::new();
    options.set_top(0.0);
    options.set_behavior(web_sys::ScrollBehavior::Smooth);
    window.scroll_to_with_scroll_to_options(&options);
}

#[cfg(not(feature = "hydrate"))]
fn scroll_to_top() {}
