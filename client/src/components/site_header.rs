//! Top bar with the brand, the signed-in email and the sign-out action.

use leptos::prelude::*;

#[component]
pub fn SiteHeader(#[prop(into)] email: Signal<String>, on_sign_out: Callback<()>) -> impl IntoView {
    let signing_out = RwSignal::new(false);

    view! {
        <header class="site-header toolbar">
            <h1 class="site-header__brand">"eatin"</h1>
            <span class="toolbar__spacer"></span>
            <span class="toolbar__self">{move || email.get()}</span>
            <button
                class="btn toolbar__logout"
                disabled=move || signing_out.get()
                on:click=move |_| {
                    signing_out.set(true);
                    on_sign_out.run(());
                }
            >
                "Sign out"
            </button>
        </header>
    }
}
