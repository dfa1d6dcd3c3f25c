//! Session Store bound to a signal, plus its gateway subscription.
//!
//! SYSTEM CONTEXT
//! ==============
//! `install_session` is called once by the root component. It creates the
//! store, provides it as context, subscribes it to the gateway for as long
//! as the root owner lives, and issues the one bootstrap fetch in the
//! browser. Server renders stay in the loading state, which is also what the
//! browser starts from, so hydration sees identical markup.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use diary::guard::{self, GuardDecision};
use diary::{AuthGateway, Identity, Page, SessionCell, SessionState, SessionStore, SessionSync};
use leptos::prelude::*;

/// Handle to the app's single `SessionStore`.
#[derive(Clone, Copy)]
pub struct SessionHandle(RwSignal<SessionStore>);

impl SessionHandle {
    pub fn new() -> Self {
        Self(RwSignal::new(SessionStore::new()))
    }

    /// Current state, tracked.
    pub fn state(&self) -> SessionState {
        self.0.with(|store| store.state().clone())
    }

    /// Signed-in identity, tracked.
    pub fn identity(&self) -> Option<Identity> {
        self.0.with(|store| store.identity().cloned())
    }

    /// Identity without subscribing the caller.
    pub fn identity_untracked(&self) -> Option<Identity> {
        self.0.with_untracked(|store| store.identity().cloned())
    }

    /// Guard verdict for `page`, tracked.
    pub fn decide(&self, page: Page) -> GuardDecision {
        self.0.with(|store| guard::decide(store.state(), page))
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCell for SessionHandle {
    fn update_store<R>(&self, f: impl FnOnce(&mut SessionStore) -> R) -> Option<R> {
        self.0.try_update(f)
    }
}

/// Create the session store, wire it to `gateway`, and provide it as context.
pub fn install_session(gateway: Arc<dyn AuthGateway>) -> SessionHandle {
    let session = SessionHandle::new();
    provide_context(session);

    let sync = SessionSync::attach(session, gateway.as_ref());
    on_cleanup(move || {
        log::debug!("session view torn down; detaching from auth events");
        sync.detach();
    });

    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        diary::session::bootstrap(&session, gateway.as_ref()).await;
    });

    session
}

/// The session store provided by `install_session`.
pub fn use_session() -> SessionHandle {
    expect_context::<SessionHandle>()
}
