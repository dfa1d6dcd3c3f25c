use super::*;
use crate::gateway::{AuthEvent, AuthEventHub, SignUpOutcome};
use crate::memory::MemoryAuthGateway;
use async_trait::async_trait;
use uuid::Uuid;

fn alice() -> Identity {
    Identity { id: Uuid::new_v4(), email: Some("alice@example.com".into()) }
}

fn cell() -> Arc<Mutex<SessionStore>> {
    Arc::new(Mutex::new(SessionStore::new()))
}

fn snapshot(cell: &Arc<Mutex<SessionStore>>) -> SessionState {
    cell.lock().unwrap().state().clone()
}

/// Gateway whose bootstrap fetch is overtaken by a sign-out event.
///
/// `current_session` publishes `SignedOut` before answering with the session
/// it read earlier, which is what a slow network response looks like from
/// the store's point of view.
struct RacingGateway {
    hub: AuthEventHub,
    stale: Session,
}

#[async_trait(?Send)]
impl AuthGateway for RacingGateway {
    async fn current_session(&self) -> Result<Session, AuthError> {
        self.hub.emit(&AuthChange::signed_out());
        Ok(self.stale.clone())
    }

    fn on_session_change(&self, listener: Listener) -> Subscription {
        self.hub.subscribe(listener)
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Identity, AuthError> {
        Err(AuthError::Rejected("unsupported".into()))
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<SignUpOutcome, AuthError> {
        Err(AuthError::Rejected("unsupported".into()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

// =============================================================================
// SessionStore
// =============================================================================

#[test]
fn starts_loading_with_no_identity() {
    let store = SessionStore::new();
    assert!(store.is_loading());
    assert!(store.identity().is_none());
    assert_eq!(store.last_applied(), 0);
}

#[test]
fn bootstrap_can_be_claimed_once() {
    let mut store = SessionStore::new();
    assert!(store.begin_bootstrap().is_some());
    assert!(store.begin_bootstrap().is_none());
}

#[test]
fn bootstrap_result_settles_loading() {
    let mut store = SessionStore::new();
    let who = alice();
    let ticket = store.begin_bootstrap().unwrap();
    assert!(store.finish_bootstrap(ticket, Ok(Session::Present(who.clone()))));
    assert!(!store.is_loading());
    assert_eq!(store.identity(), Some(&who));
}

#[test]
fn bootstrap_failure_reads_as_signed_out() {
    let mut store = SessionStore::new();
    let ticket = store.begin_bootstrap().unwrap();
    assert!(store.finish_bootstrap(ticket, Err(AuthError::Network("offline".into()))));
    assert_eq!(store.state(), &SessionState { identity: None, is_loading: false });
}

#[test]
fn event_delivered_during_bootstrap_wins() {
    let mut store = SessionStore::new();
    let ticket = store.begin_bootstrap().unwrap();

    assert!(store.apply_change(&AuthChange::signed_out()));
    assert!(!store.finish_bootstrap(ticket, Ok(Session::Present(alice()))));

    assert!(store.identity().is_none());
    assert!(!store.is_loading());
}

#[test]
fn sign_in_event_during_bootstrap_is_not_undone_by_empty_result() {
    let mut store = SessionStore::new();
    let who = alice();
    let ticket = store.begin_bootstrap().unwrap();

    store.apply_change(&AuthChange::signed_in(who.clone()));
    assert!(!store.finish_bootstrap(ticket, Ok(Session::Absent)));
    assert_eq!(store.identity(), Some(&who));
}

#[test]
fn identity_tracks_last_delivered_event() {
    let mut store = SessionStore::new();
    let first = alice();
    let second = Identity { id: Uuid::new_v4(), email: None };
    let changes = [
        AuthChange::signed_in(first.clone()),
        AuthChange::new(AuthEvent::TokenRefreshed, Session::Present(first)),
        AuthChange::signed_out(),
        AuthChange::signed_in(second.clone()),
        AuthChange::new(AuthEvent::UserUpdated, Session::Present(second)),
    ];
    for change in &changes {
        assert!(store.apply_change(change));
        assert_eq!(store.identity(), change.session.identity());
        assert!(!store.is_loading());
    }
    assert_eq!(store.last_applied(), changes.len() as u64);
}

#[test]
fn subscription_failure_fails_closed() {
    let mut store = SessionStore::new();
    store.apply_change(&AuthChange::signed_in(alice()));
    assert!(store.fail_subscription(&SubscriptionError::Closed("socket dropped".into())));
    assert!(store.identity().is_none());
    assert!(!store.is_loading());
}

#[test]
fn clear_local_beats_in_flight_bootstrap() {
    let mut store = SessionStore::new();
    let ticket = store.begin_bootstrap().unwrap();
    store.clear_local();
    assert!(!store.finish_bootstrap(ticket, Ok(Session::Present(alice()))));
    assert!(store.identity().is_none());
}

// =============================================================================
// bootstrap / SessionSync
// =============================================================================

#[tokio::test]
async fn bootstrap_picks_up_existing_session() {
    let gateway = MemoryAuthGateway::new();
    let who = gateway.register("alice@example.com", "hunter22");
    gateway.sign_in_with_password("alice@example.com", "hunter22").await.unwrap();

    let cell = cell();
    assert!(bootstrap(&cell, &gateway).await);
    assert_eq!(snapshot(&cell), SessionState { identity: Some(who), is_loading: false });
}

#[tokio::test]
async fn bootstrap_runs_at_most_once() {
    let gateway = MemoryAuthGateway::new();
    let cell = cell();
    assert!(bootstrap(&cell, &gateway).await);

    gateway.fail_next_session_fetch(AuthError::Network("should not be asked".into()));
    assert!(!bootstrap(&cell, &gateway).await);
    // The injected failure is still pending because no second fetch happened.
    assert!(gateway.current_session().await.is_err());
}

#[tokio::test]
async fn bootstrap_failure_leaves_user_signed_out() {
    let gateway = MemoryAuthGateway::new();
    gateway.fail_next_session_fetch(AuthError::Network("timeout".into()));

    let cell = cell();
    assert!(bootstrap(&cell, &gateway).await);
    assert_eq!(snapshot(&cell), SessionState { identity: None, is_loading: false });
}

#[tokio::test]
async fn slow_bootstrap_does_not_resurrect_signed_out_session() {
    let gateway = RacingGateway { hub: AuthEventHub::new(), stale: Session::Present(alice()) };
    let cell = cell();
    let sync = SessionSync::attach(cell.clone(), &gateway);

    assert!(!bootstrap(&cell, &gateway).await);
    assert_eq!(snapshot(&cell), SessionState { identity: None, is_loading: false });
    assert!(sync.is_attached());
}

#[tokio::test]
async fn sync_applies_gateway_events() {
    let gateway = MemoryAuthGateway::new();
    let who = gateway.register("alice@example.com", "hunter22");
    let cell = cell();
    let _sync = SessionSync::attach(cell.clone(), &gateway);

    gateway.sign_in_with_password("alice@example.com", "hunter22").await.unwrap();
    assert_eq!(snapshot(&cell).identity, Some(who));

    gateway.sign_out().await.unwrap();
    assert_eq!(snapshot(&cell).identity, None);
}

#[tokio::test]
async fn detached_sync_hears_nothing() {
    let gateway = MemoryAuthGateway::new();
    gateway.register("alice@example.com", "hunter22");
    let cell = cell();
    let sync = SessionSync::attach(cell.clone(), &gateway);
    assert_eq!(gateway.hub().listener_count(), 1);

    sync.detach();
    assert_eq!(gateway.hub().listener_count(), 0);

    gateway.sign_in_with_password("alice@example.com", "hunter22").await.unwrap();
    assert_eq!(snapshot(&cell), SessionState::default());
}

#[tokio::test]
async fn stream_failure_signs_out_locally() {
    let gateway = MemoryAuthGateway::new();
    gateway.register("alice@example.com", "hunter22");
    let cell = cell();
    let sync = SessionSync::attach(cell.clone(), &gateway);
    gateway.sign_in_with_password("alice@example.com", "hunter22").await.unwrap();

    gateway.hub().fail(SubscriptionError::Closed("socket dropped".into()));

    assert_eq!(snapshot(&cell), SessionState { identity: None, is_loading: false });
    assert!(!sync.is_attached());
}

// =============================================================================
// sign_out
// =============================================================================

#[tokio::test]
async fn sign_out_clears_and_navigates_to_auth() {
    let gateway = MemoryAuthGateway::new();
    gateway.register("alice@example.com", "hunter22");
    gateway.sign_in_with_password("alice@example.com", "hunter22").await.unwrap();
    let cell = cell();
    bootstrap(&cell, &gateway).await;

    let mut went_to = None;
    sign_out(&cell, &gateway, |page| went_to = Some(page)).await;

    assert_eq!(went_to, Some(Page::Auth));
    assert!(snapshot(&cell).identity.is_none());
}

#[tokio::test]
async fn sign_out_navigates_even_when_provider_fails() {
    let gateway = MemoryAuthGateway::new();
    gateway.register("alice@example.com", "hunter22");
    gateway.sign_in_with_password("alice@example.com", "hunter22").await.unwrap();
    let cell = cell();
    bootstrap(&cell, &gateway).await;

    gateway.fail_next_sign_out(AuthError::Network("offline".into()));
    let mut went_to = None;
    sign_out(&cell, &gateway, |page| went_to = Some(page)).await;

    assert_eq!(went_to, Some(Page::Auth));
    assert_eq!(snapshot(&cell), SessionState { identity: None, is_loading: false });
}
