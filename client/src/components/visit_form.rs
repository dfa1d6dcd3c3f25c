//! Add/edit form for a single visit.
//!
//! DESIGN
//! ======
//! Field edits write straight into `DashboardState::form`; validation and
//! the write itself happen in `diary::dashboard` when `on_submit` runs, so
//! this component stays a thin binding layer.

#[cfg(test)]
#[path = "visit_form_test.rs"]
mod visit_form_test;

use diary::dashboard::DashboardState;
use leptos::prelude::*;

use crate::state::dashboard::DashboardHandle;

fn form_title(editing: bool) -> &'static str {
    if editing { "Edit Visit" } else { "Add Restaurant Visit" }
}

fn submit_label(submitting: bool, editing: bool) -> &'static str {
    match (submitting, editing) {
        (true, _) => "Saving...",
        (false, true) => "Update",
        (false, false) => "Add Visit",
    }
}

/// `max_date` is today's date as `YYYY-MM-DD`; browsers use it to block
/// picking a future day.
#[component]
pub fn VisitForm(
    dashboard: DashboardHandle,
    #[prop(into)] max_date: String,
    on_submit: Callback<()>,
    on_cancel: Callback<()>,
) -> impl IntoView {
    let editing = move || dashboard.with(DashboardState::is_editing);
    let submitting = move || dashboard.with(|s| s.submitting);

    view! {
        <section class="card visit-form">
            <h2 class="card__title">{move || form_title(editing())}</h2>
            <p class="card__description">"Log where you ate and when"</p>
            <form
                class="visit-form__fields"
                on:submit=move |ev: leptos::ev::SubmitEvent| {
                    ev.prevent_default();
                    on_submit.run(());
                }
            >
                <label class="field">
                    "Restaurant Name"
                    <input
                        type="text"
                        required
                        placeholder="e.g., Joe's Pizza"
                        prop:value=move || dashboard.with(|s| s.form.restaurant_name.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            dashboard.update(|s| s.form.restaurant_name = value);
                        }
                    />
                </label>
                <label class="field">
                    "Visit Date"
                    <input
                        type="date"
                        required
                        max=max_date
                        prop:value=move || dashboard.with(|s| s.form.visited_on.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            dashboard.update(|s| s.form.visited_on = value);
                        }
                    />
                </label>
                <label class="field">
                    "Notes (optional)"
                    <textarea
                        rows="3"
                        placeholder="What did you eat? How was it?"
                        prop:value=move || dashboard.with(|s| s.form.notes.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            dashboard.update(|s| s.form.notes = value);
                        }
                    ></textarea>
                </label>
                {move || {
                    dashboard
                        .with(|s| s.notice.clone())
                        .map(|n| {
                            let is_error = n.is_error();
                            view! {
                                <p class="notice" class:notice--error=is_error>
                                    {n.message}
                                    <button
                                        class="notice__dismiss"
                                        type="button"
                                        aria-label="Dismiss"
                                        on:click=move |_| dashboard.update(DashboardState::dismiss_notice)
                                    >
                                        "×"
                                    </button>
                                </p>
                            }
                        })
                }}
                <div class="visit-form__actions">
                    <button class="btn btn--primary" type="submit" disabled=submitting>
                        {move || submit_label(submitting(), editing())}
                    </button>
                    <Show when=editing>
                        <button class="btn" type="button" on:click=move |_| on_cancel.run(())>
                            "Cancel"
                        </button>
                    </Show>
                </div>
            </form>
        </section>
    }
    .into_any()
}
