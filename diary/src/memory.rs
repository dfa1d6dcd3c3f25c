//! In-process identity provider and record store.
//!
//! DESIGN
//! ======
//! These stand in for the hosted backend in tests and local runs. They keep
//! the hosted behavior that matters to the client: the gateway publishes
//! auth events through an `AuthEventHub`, and the visit store enforces
//! ownership the way row-level security does, answering another owner's
//! rows with errors rather than silent no-ops.
//!
//! Timestamps come from the system clock, so use these on native targets.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::{AuthError, RemoteError};
use crate::gateway::{AuthChange, AuthEvent, AuthEventHub, AuthGateway, Listener, SignUpOutcome, Subscription};
use crate::model::{Identity, NewVisit, Session, Visit, VisitPatch, sort_newest_first};
use crate::repository::VisitRepository;

const MIN_PASSWORD_LEN: usize = 6;
const RLS_VIOLATION: &str = "new row violates row-level security policy for table \"visits\"";

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Debug, Clone)]
struct Account {
    id: Uuid,
    email: String,
    password: String,
    confirmed: bool,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity { id: self.id, email: Some(self.email.clone()) }
    }
}

#[derive(Default)]
struct AuthInner {
    accounts: HashMap<String, Account>,
    current: Session,
    fail_session_fetch: Option<AuthError>,
    fail_sign_out: Option<AuthError>,
}

/// Identity provider holding accounts in memory.
#[derive(Clone, Default)]
pub struct MemoryAuthGateway {
    inner: Arc<Mutex<AuthInner>>,
    hub: AuthEventHub,
    require_confirmation: bool,
}

impl MemoryAuthGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign-ups wait for `confirm_email` before they can sign in.
    #[must_use]
    pub fn with_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Seed a confirmed account and return its identity.
    pub fn register(&self, email: &str, password: &str) -> Identity {
        let account = Account {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password: password.to_owned(),
            confirmed: true,
        };
        let identity = account.identity();
        guard(&self.inner).accounts.insert(account.email.clone(), account);
        identity
    }

    /// Mark a pending sign-up as confirmed. Returns whether it existed.
    pub fn confirm_email(&self, email: &str) -> bool {
        guard(&self.inner)
            .accounts
            .get_mut(&normalize_email(email))
            .map(|account| account.confirmed = true)
            .is_some()
    }

    /// Make the next `current_session` call fail with `err`.
    pub fn fail_next_session_fetch(&self, err: AuthError) {
        guard(&self.inner).fail_session_fetch = Some(err);
    }

    /// Make the next `sign_out` call fail with `err`. The local session is
    /// still dropped, but no `SignedOut` event is published.
    pub fn fail_next_sign_out(&self, err: AuthError) {
        guard(&self.inner).fail_sign_out = Some(err);
    }

    /// Publish `TokenRefreshed` for the current session, if any.
    pub fn refresh_token(&self) {
        let session = guard(&self.inner).current.clone();
        if session.is_present() {
            self.hub.emit(&AuthChange::new(AuthEvent::TokenRefreshed, session));
        }
    }

    /// The hub events are published on.
    #[must_use]
    pub fn hub(&self) -> &AuthEventHub {
        &self.hub
    }

    fn open_session(&self, identity: &Identity) {
        guard(&self.inner).current = Session::Present(identity.clone());
        self.hub.emit(&AuthChange::signed_in(identity.clone()));
    }
}

#[async_trait(?Send)]
impl AuthGateway for MemoryAuthGateway {
    async fn current_session(&self) -> Result<Session, AuthError> {
        let mut inner = guard(&self.inner);
        if let Some(err) = inner.fail_session_fetch.take() {
            return Err(err);
        }
        Ok(inner.current.clone())
    }

    fn on_session_change(&self, listener: Listener) -> Subscription {
        self.hub.subscribe(listener)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = {
            let inner = guard(&self.inner);
            let account = inner
                .accounts
                .get(&normalize_email(email))
                .filter(|account| account.password == password)
                .ok_or_else(|| AuthError::Rejected("Invalid login credentials".into()))?;
            if !account.confirmed {
                return Err(AuthError::Rejected("Email not confirmed".into()));
            }
            account.identity()
        };
        self.open_session(&identity);
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Rejected("Unable to validate email address: invalid format".into()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Rejected(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        let account = {
            let mut inner = guard(&self.inner);
            if inner.accounts.contains_key(&email) {
                return Err(AuthError::Rejected("User already registered".into()));
            }
            let account = Account {
                id: Uuid::new_v4(),
                email: email.clone(),
                password: password.to_owned(),
                confirmed: !self.require_confirmation,
            };
            inner.accounts.insert(email, account.clone());
            account
        };
        if !account.confirmed {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }
        let identity = account.identity();
        self.open_session(&identity);
        Ok(SignUpOutcome::SignedIn(identity))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let failure = {
            let mut inner = guard(&self.inner);
            inner.current = Session::Absent;
            inner.fail_sign_out.take()
        };
        if let Some(err) = failure {
            return Err(err);
        }
        self.hub.emit(&AuthChange::signed_out());
        Ok(())
    }
}

// =============================================================================
// VISITS
// =============================================================================

#[derive(Default)]
struct Table {
    rows: Vec<Visit>,
    last_stamp: Option<OffsetDateTime>,
}

impl Table {
    /// Wall clock, nudged forward so stamps strictly increase.
    fn next_stamp(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

/// Shared `visits` table. Hand out per-identity views with `repository_for`.
#[derive(Clone, Default)]
pub struct MemoryVisitStore {
    table: Arc<Mutex<Table>>,
}

impl MemoryVisitStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository acting as `caller` (`None` = anonymous).
    #[must_use]
    pub fn repository_for(&self, caller: Option<&Identity>) -> MemoryVisitRepository {
        MemoryVisitRepository { store: self.clone(), caller: caller.map(|identity| identity.id) }
    }

    /// Row count across all owners.
    #[must_use]
    pub fn len(&self) -> usize {
        guard(&self.table).rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One identity's view of a `MemoryVisitStore`.
#[derive(Clone)]
pub struct MemoryVisitRepository {
    store: MemoryVisitStore,
    caller: Option<Uuid>,
}

impl MemoryVisitRepository {
    fn caller(&self) -> Result<Uuid, RemoteError> {
        self.caller.ok_or(RemoteError::Unauthenticated)
    }
}

#[async_trait(?Send)]
impl VisitRepository for MemoryVisitRepository {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Visit>, RemoteError> {
        let caller = self.caller()?;
        if caller != owner_id {
            return Err(RemoteError::Forbidden(format!("cannot read visits of {owner_id}")));
        }
        let mut visits: Vec<Visit> = guard(&self.store.table)
            .rows
            .iter()
            .filter(|visit| visit.owner_id == caller)
            .cloned()
            .collect();
        sort_newest_first(&mut visits);
        Ok(visits)
    }

    async fn create(&self, visit: NewVisit) -> Result<Visit, RemoteError> {
        let caller = self.caller()?;
        if visit.owner_id != caller {
            return Err(RemoteError::Forbidden(RLS_VIOLATION.into()));
        }
        if visit.restaurant_name.trim().is_empty() {
            return Err(RemoteError::Rejected("restaurant_name must not be empty".into()));
        }
        let mut table = guard(&self.store.table);
        let stamp = table.next_stamp();
        let row = Visit {
            id: Uuid::new_v4(),
            owner_id: caller,
            restaurant_name: visit.restaurant_name,
            visited_on: visit.visited_on,
            notes: visit.notes,
            created_at: stamp,
            updated_at: stamp,
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: VisitPatch) -> Result<Visit, RemoteError> {
        let caller = self.caller()?;
        if patch.restaurant_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(RemoteError::Rejected("restaurant_name must not be empty".into()));
        }
        let mut table = guard(&self.store.table);
        let stamp = table.next_stamp();
        let row = table
            .rows
            .iter_mut()
            .find(|visit| visit.id == id && visit.owner_id == caller)
            .ok_or(RemoteError::NotFound(id))?;
        patch.apply_to(row);
        row.updated_at = stamp;
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RemoteError> {
        let caller = self.caller()?;
        let mut table = guard(&self.store.table);
        let before = table.rows.len();
        table.rows.retain(|visit| !(visit.id == id && visit.owner_id == caller));
        if table.rows.len() == before {
            return Err(RemoteError::NotFound(id));
        }
        Ok(())
    }
}
