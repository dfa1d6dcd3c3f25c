//! Sign-in / sign-up page (`/auth`).
//!
//! A successful sign-in publishes `SignedIn`; the route guard then moves the
//! user to the dashboard, so this page never navigates by itself.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use diary::dashboard::Notice;
use diary::{Page, SignUpOutcome};
use leptos::prelude::*;

use crate::app::use_services;
use crate::util::guard::RouteGuard;

const CONFIRM_EMAIL_MESSAGE: &str = "Check your email for the confirmation link!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AuthMode {
    SignIn,
    SignUp,
}

impl AuthMode {
    fn toggled(self) -> Self {
        match self {
            Self::SignIn => Self::SignUp,
            Self::SignUp => Self::SignIn,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::SignIn => "Sign in to your account",
            Self::SignUp => "Create your account",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::SignIn => "Welcome back! Please sign in to continue.",
            Self::SignUp => "Join eatin to start tracking your dining experiences.",
        }
    }

    fn submit_label(self, busy: bool) -> &'static str {
        match (busy, self) {
            (true, _) => "Loading...",
            (false, Self::SignIn) => "Sign in",
            (false, Self::SignUp) => "Sign up",
        }
    }

    fn toggle_prompt(self) -> &'static str {
        match self {
            Self::SignIn => "Don't have an account?",
            Self::SignUp => "Already have an account?",
        }
    }

    fn toggle_label(self) -> &'static str {
        match self {
            Self::SignIn => "Create an account",
            Self::SignUp => "Sign in instead",
        }
    }

    fn password_autocomplete(self) -> &'static str {
        match self {
            Self::SignIn => "current-password",
            Self::SignUp => "new-password",
        }
    }
}

/// Trimmed email and raw password, or the message to show.
fn validate_credentials(email: &str, password: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Enter your email address.");
    }
    if password.is_empty() {
        return Err("Enter your password.");
    }
    Ok((email.to_owned(), password.to_owned()))
}

fn sign_up_notice(outcome: &SignUpOutcome) -> Option<Notice> {
    match outcome {
        SignUpOutcome::ConfirmationRequired => Some(Notice::success(CONFIRM_EMAIL_MESSAGE)),
        SignUpOutcome::SignedIn(_) => None,
    }
}

#[component]
pub fn AuthPage() -> impl IntoView {
    view! {
        <RouteGuard page=Page::Auth>
            <AuthCard/>
        </RouteGuard>
    }
}

#[component]
fn AuthCard() -> impl IntoView {
    let services = use_services();
    let mode = RwSignal::new(AuthMode::SignIn);
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    let notice = RwSignal::new(None::<Notice>);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        let (email_value, password_value) = match validate_credentials(&email.get_untracked(), &password.get_untracked()) {
            Ok(credentials) => credentials,
            Err(message) => {
                notice.set(Some(Notice::error(message)));
                return;
            }
        };
        busy.set(true);
        notice.set(None);
        let current_mode = mode.get_untracked();
        let gateway = services.auth.clone();
        leptos::task::spawn_local(async move {
            let result = match current_mode {
                AuthMode::SignIn => gateway.sign_in_with_password(&email_value, &password_value).await.map(|_| None),
                AuthMode::SignUp => gateway
                    .sign_up(&email_value, &password_value)
                    .await
                    .map(|outcome| sign_up_notice(&outcome)),
            };
            match result {
                Ok(message) => notice.try_set(message),
                Err(e) => {
                    log::warn!("{current_mode:?} failed: {e}");
                    notice.try_set(Some(Notice::error(e.to_string())))
                }
            };
            busy.try_set(false);
        });
    };

    let on_toggle = move |_| {
        mode.update(|m| *m = m.toggled());
        notice.set(None);
        email.set(String::new());
        password.set(String::new());
    };

    view! {
        <div class="auth-page">
            <div class="auth-page__brand">
                <h1>"eatin"</h1>
                <p>"your restaurant diary"</p>
            </div>
            <div class="card">
                <h2 class="card__title">{move || mode.get().title()}</h2>
                <p class="card__description">{move || mode.get().description()}</p>
                <form class="auth-form" on:submit=on_submit>
                    <label class="field">
                        "Email address"
                        <input
                            type="email"
                            name="email"
                            autocomplete="email"
                            required
                            placeholder="Enter your email"
                            prop:value=move || email.get()
                            on:input=move |ev| email.set(event_target_value(&ev))
                        />
                    </label>
                    <label class="field">
                        "Password"
                        <input
                            type="password"
                            name="password"
                            required
                            placeholder="Enter your password"
                            autocomplete=move || mode.get().password_autocomplete()
                            prop:value=move || password.get()
                            on:input=move |ev| password.set(event_target_value(&ev))
                        />
                    </label>
                    {move || {
                        notice
                            .get()
                            .map(|n| {
                                let is_error = n.is_error();
                                view! {
                                    <p class="notice" class:notice--error=is_error>
                                        {n.message}
                                    </p>
                                }
                            })
                    }}
                    <button class="btn btn--primary btn--wide" type="submit" disabled=move || busy.get()>
                        {move || mode.get().submit_label(busy.get())}
                    </button>
                </form>
                <p class="auth-form__divider">{move || mode.get().toggle_prompt()}</p>
                <button class="btn btn--wide" type="button" on:click=on_toggle>
                    {move || mode.get().toggle_label()}
                </button>
            </div>
        </div>
    }
    .into_any()
}
