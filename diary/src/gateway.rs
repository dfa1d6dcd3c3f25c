//! Identity-provider boundary and the auth-state change stream.
//!
//! ARCHITECTURE
//! ============
//! `AuthGateway` is the only way the client learns about sessions. Gateways
//! publish session transitions through an `AuthEventHub`; listeners receive
//! a `Subscription` handle that detaches them when dropped, so a torn-down
//! view can never be called back.
//!
//! Gateway futures are `?Send`: the browser transport is single-threaded and
//! its futures are not `Send`. The gateway objects themselves are
//! `Send + Sync` so they can sit in shared UI context.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;

use crate::error::{AuthError, SubscriptionError};
use crate::model::{Identity, Session};

/// Kind of session transition reported by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl AuthEvent {
    /// Provider spelling of the event, used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
        }
    }
}

/// A session transition together with the session it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Session,
}

impl AuthChange {
    #[must_use]
    pub fn new(event: AuthEvent, session: Session) -> Self {
        Self { event, session }
    }

    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        Self::new(AuthEvent::SignedIn, Session::Present(identity))
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self::new(AuthEvent::SignedOut, Session::Absent)
    }
}

/// What a successful sign-up produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The provider opened a session right away.
    SignedIn(Identity),
    /// The provider sent a confirmation email; no session yet.
    ConfirmationRequired,
}

/// Callback invoked for every delivered change, or once when the stream fails.
pub type Listener = Arc<dyn Fn(&Result<AuthChange, SubscriptionError>) + Send + Sync>;

/// Thin interface to the external identity provider.
#[async_trait(?Send)]
pub trait AuthGateway: Send + Sync {
    /// Fetch whatever session the provider already holds for this client.
    async fn current_session(&self) -> Result<Session, AuthError>;

    /// Register `listener` for session transitions until the returned handle
    /// is dropped.
    fn on_session_change(&self, listener: Listener) -> Subscription;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    /// Revoke the current session. Gateways clear their local copy even
    /// when the provider call fails.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

// =============================================================================
// EVENT HUB
// =============================================================================

struct Entry {
    id: u64,
    active: Arc<AtomicBool>,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
    failed: Option<SubscriptionError>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fan-out of auth changes to registered listeners.
///
/// Cloning shares the same listener set.
#[derive(Clone, Default)]
pub struct AuthEventHub {
    registry: Arc<Mutex<Registry>>,
}

impl AuthEventHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. On a failed hub the listener immediately hears
    /// the failure and the handle comes back already detached.
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let mut registry = lock(&self.registry);
        if let Some(err) = registry.failed.clone() {
            drop(registry);
            listener(&Err(err));
            return Subscription::detached();
        }
        registry.next_id += 1;
        let id = registry.next_id;
        let active = Arc::new(AtomicBool::new(true));
        registry.entries.push(Entry { id, active: active.clone(), listener });
        Subscription { registry: Arc::downgrade(&self.registry), id, active }
    }

    /// Deliver `change` to every listener still attached at call time.
    pub fn emit(&self, change: &AuthChange) {
        let targets = self.snapshot();
        log::debug!("auth event {} -> {} listener(s)", change.event.as_str(), targets.len());
        let delivered = Ok(change.clone());
        for (active, listener) in targets {
            // A listener earlier in the batch may have torn this one down.
            if active.load(Ordering::Acquire) {
                listener(&delivered);
            }
        }
    }

    /// Report a stream failure to every listener and stop accepting new ones.
    pub fn fail(&self, error: SubscriptionError) {
        let targets = {
            let mut registry = lock(&self.registry);
            registry.failed = Some(error.clone());
            registry
                .entries
                .drain(..)
                .map(|entry| (entry.active, entry.listener))
                .collect::<Vec<_>>()
        };
        log::error!("{error}; notifying {} listener(s)", targets.len());
        let failure = Err(error);
        for (active, listener) in targets {
            if active.swap(false, Ordering::AcqRel) {
                listener(&failure);
            }
        }
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    fn snapshot(&self) -> Vec<(Arc<AtomicBool>, Listener)> {
        lock(&self.registry)
            .entries
            .iter()
            .map(|entry| (entry.active.clone(), entry.listener.clone()))
            .collect()
    }
}

/// Handle for one registered listener. Dropping it detaches the listener.
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// A handle bound to nothing, for gateways without a change stream.
    #[must_use]
    pub fn detached() -> Self {
        Self { registry: Weak::new(), id: 0, active: Arc::new(AtomicBool::new(false)) }
    }

    /// Whether the listener can still be called.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Detach now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).entries.retain(|entry| entry.id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
