//! One row of the visit list.

use diary::Visit;
use leptos::prelude::*;
use uuid::Uuid;

#[component]
pub fn VisitCard(visit: Visit, #[prop(optional)] active: bool, on_edit: Callback<Uuid>, on_delete: Callback<Uuid>) -> impl IntoView {
    let id = visit.id;
    let date = visit.display_date();

    view! {
        <article class="visit-card" class:visit-card--active=active>
            <div class="visit-card__body">
                <h3 class="visit-card__name">{visit.restaurant_name}</h3>
                <p class="visit-card__date">{date}</p>
                {visit.notes.map(|notes| view! { <p class="visit-card__notes">{notes}</p> })}
            </div>
            <div class="visit-card__actions">
                <button class="btn btn--small" on:click=move |_| on_edit.run(id)>
                    "Edit"
                </button>
                <button class="btn btn--small btn--danger-outline" on:click=move |_| on_delete.run(id)>
                    "Delete"
                </button>
            </div>
        </article>
    }
}
