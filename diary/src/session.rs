//! Session Store: who is signed in right now.
//!
//! DESIGN
//! ======
//! The store is an explicitly constructed value, not ambient global state.
//! It starts as `{ identity: None, is_loading: true }` and changes only
//! through three doors: the single bootstrap fetch, delivered auth events,
//! and a local clear on sign-out.
//!
//! ORDERING
//! ========
//! Every update carries a sequence number and is applied only if it is
//! newer than the last applied one. The bootstrap fetch draws its number
//! when it is issued; events and local clears draw theirs when delivered.
//! A slow bootstrap that completes after an event was delivered is
//! therefore stale and dropped, instead of resurrecting an old session.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{AuthError, SubscriptionError};
use crate::gateway::{AuthChange, AuthGateway, Listener, Subscription};
use crate::guard::Page;
use crate::model::{Identity, Session};

/// Public view of the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub is_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self { identity: None, is_loading: true }
    }
}

/// Permission to complete the one bootstrap fetch.
#[derive(Debug, PartialEq, Eq)]
pub struct BootstrapTicket {
    seq: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStore {
    state: SessionState,
    /// Highest sequence number handed out.
    issued: u64,
    /// Sequence number of the update currently reflected in `state`.
    applied: u64,
    bootstrap_issued: bool,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    /// Sequence number of the last applied update (0 before any).
    #[must_use]
    pub fn last_applied(&self) -> u64 {
        self.applied
    }

    fn next_seq(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn apply(&mut self, seq: u64, identity: Option<Identity>) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        self.state = SessionState { identity, is_loading: false };
        true
    }

    /// Claim the bootstrap fetch. Returns `None` once it has been claimed.
    pub fn begin_bootstrap(&mut self) -> Option<BootstrapTicket> {
        if self.bootstrap_issued {
            return None;
        }
        self.bootstrap_issued = true;
        Some(BootstrapTicket { seq: self.next_seq() })
    }

    /// Record the bootstrap result. A failure counts as "no session".
    ///
    /// Returns whether the result was applied; it is dropped when a newer
    /// update landed while the fetch was in flight.
    pub fn finish_bootstrap(&mut self, ticket: BootstrapTicket, result: Result<Session, AuthError>) -> bool {
        let identity = match result {
            Ok(session) => session.into_identity(),
            Err(err) => {
                log::warn!("session bootstrap failed, treating as signed out: {err}");
                None
            }
        };
        let applied = self.apply(ticket.seq, identity);
        if !applied {
            log::info!("discarding stale session bootstrap (seq {} <= {})", ticket.seq, self.applied);
        }
        applied
    }

    /// Apply a delivered auth event. Always newer than anything before it.
    pub fn apply_change(&mut self, change: &AuthChange) -> bool {
        let seq = self.next_seq();
        log::info!(
            "auth state changed: {} ({})",
            change.event.as_str(),
            change.session.identity().map_or_else(|| "no user".to_owned(), Identity::label)
        );
        self.apply(seq, change.session.identity().cloned())
    }

    /// The change stream died: fail closed to signed out.
    pub fn fail_subscription(&mut self, err: &SubscriptionError) -> bool {
        log::error!("auth subscription failed, signing out locally: {err}");
        let seq = self.next_seq();
        self.apply(seq, None)
    }

    /// Forget the session locally (sign-out, whatever the provider said).
    pub fn clear_local(&mut self) -> bool {
        let seq = self.next_seq();
        self.apply(seq, None)
    }
}

// =============================================================================
// SYNCHRONIZATION
// =============================================================================

/// Shared, mutable home of a `SessionStore`.
///
/// Returns `None` from `update_store` once the owning view is gone, so late
/// completions fall on the floor instead of touching disposed state.
pub trait SessionCell: Clone + Send + Sync + 'static {
    fn update_store<R>(&self, f: impl FnOnce(&mut SessionStore) -> R) -> Option<R>;
}

impl SessionCell for Arc<Mutex<SessionStore>> {
    fn update_store<R>(&self, f: impl FnOnce(&mut SessionStore) -> R) -> Option<R> {
        let mut store = self.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut store))
    }
}

/// Live link between a gateway's change stream and a session cell.
///
/// Dropping it (view teardown) unsubscribes.
#[derive(Debug)]
pub struct SessionSync {
    subscription: Subscription,
}

impl SessionSync {
    /// Subscribe `cell` to every session change `gateway` publishes.
    pub fn attach<C: SessionCell>(cell: C, gateway: &dyn AuthGateway) -> Self {
        let listener: Listener = Arc::new(move |signal: &Result<AuthChange, SubscriptionError>| match signal {
            Ok(change) => {
                cell.update_store(|store| store.apply_change(change));
            }
            Err(err) => {
                cell.update_store(|store| store.fail_subscription(err));
            }
        });
        Self { subscription: gateway.on_session_change(listener) }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn detach(self) {
        drop(self);
    }
}

/// Issue the one bootstrap fetch for `cell`. Later calls are no-ops.
///
/// Returns whether the fetched session ended up in the store.
pub async fn bootstrap<C: SessionCell>(cell: &C, gateway: &dyn AuthGateway) -> bool {
    let Some(Some(ticket)) = cell.update_store(SessionStore::begin_bootstrap) else {
        return false;
    };
    log::debug!("checking for an existing session");
    let result = gateway.current_session().await;
    cell.update_store(|store| store.finish_bootstrap(ticket, result))
        .unwrap_or(false)
}

/// Sign out and hand `/auth` to `navigate`, whether or not the provider
/// accepted the revoke. The local session is cleared either way so the
/// route guard cannot bounce the user back into protected pages.
pub async fn sign_out<C: SessionCell>(cell: &C, gateway: &dyn AuthGateway, navigate: impl FnOnce(Page)) {
    match gateway.sign_out().await {
        Ok(()) => log::info!("signed out"),
        Err(err) => log::warn!("sign-out failed upstream, clearing local session anyway: {err}"),
    }
    cell.update_store(SessionStore::clear_local);
    navigate(Page::Auth);
}
