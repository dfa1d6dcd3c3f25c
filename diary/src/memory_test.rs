use super::*;
use time::macros::date;

fn joes_pizza(owner: &Identity) -> NewVisit {
    NewVisit {
        owner_id: owner.id,
        restaurant_name: "Joe's Pizza".into(),
        visited_on: date!(2024 - 01 - 15),
        notes: None,
    }
}

// =============================================================================
// MemoryAuthGateway
// =============================================================================

#[tokio::test]
async fn sign_in_with_registered_account_opens_session() {
    let gateway = MemoryAuthGateway::new();
    let alice = gateway.register("Alice@Example.com", "hunter22");

    let identity = gateway
        .sign_in_with_password(" alice@example.com ", "hunter22")
        .await
        .unwrap();
    assert_eq!(identity, alice);
    assert_eq!(gateway.current_session().await.unwrap(), Session::Present(alice));
}

#[tokio::test]
async fn sign_in_with_wrong_password_is_rejected() {
    let gateway = MemoryAuthGateway::new();
    gateway.register("alice@example.com", "hunter22");

    let err = gateway
        .sign_in_with_password("alice@example.com", "nope")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Rejected("Invalid login credentials".into()));
    assert_eq!(gateway.current_session().await.unwrap(), Session::Absent);
}

#[tokio::test]
async fn sign_up_without_confirmation_signs_in() {
    let gateway = MemoryAuthGateway::new();
    let outcome = gateway.sign_up("bob@example.com", "secret1").await.unwrap();
    let SignUpOutcome::SignedIn(identity) = outcome else {
        panic!("expected immediate sign-in");
    };
    assert_eq!(identity.email.as_deref(), Some("bob@example.com"));
    assert!(gateway.current_session().await.unwrap().is_present());
}

#[tokio::test]
async fn sign_up_with_confirmation_waits_for_email() {
    let gateway = MemoryAuthGateway::new().with_email_confirmation();
    let outcome = gateway.sign_up("bob@example.com", "secret1").await.unwrap();
    assert_eq!(outcome, SignUpOutcome::ConfirmationRequired);

    let err = gateway
        .sign_in_with_password("bob@example.com", "secret1")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Rejected("Email not confirmed".into()));

    assert!(gateway.confirm_email("bob@example.com"));
    assert!(gateway.sign_in_with_password("bob@example.com", "secret1").await.is_ok());
}

#[tokio::test]
async fn sign_up_rejects_duplicates_and_short_passwords() {
    let gateway = MemoryAuthGateway::new();
    gateway.register("carol@example.com", "secret1");

    let dup = gateway.sign_up("carol@example.com", "secret1").await.unwrap_err();
    assert_eq!(dup, AuthError::Rejected("User already registered".into()));

    let short = gateway.sign_up("dan@example.com", "123").await.unwrap_err();
    assert!(short.to_string().contains("at least 6 characters"));

    let bad_email = gateway.sign_up("not-an-email", "secret1").await.unwrap_err();
    assert!(bad_email.to_string().contains("invalid format"));
}

#[tokio::test]
async fn failed_sign_out_still_drops_local_session() {
    let gateway = MemoryAuthGateway::new();
    gateway.register("alice@example.com", "hunter22");
    gateway.sign_in_with_password("alice@example.com", "hunter22").await.unwrap();

    gateway.fail_next_sign_out(AuthError::Network("offline".into()));
    assert!(gateway.sign_out().await.is_err());
    assert_eq!(gateway.current_session().await.unwrap(), Session::Absent);
}

#[tokio::test]
async fn injected_session_fetch_failure_fires_once() {
    let gateway = MemoryAuthGateway::new();
    gateway.fail_next_session_fetch(AuthError::Network("timeout".into()));
    assert!(gateway.current_session().await.is_err());
    assert!(gateway.current_session().await.is_ok());
}

#[tokio::test]
async fn gateway_publishes_sign_in_refresh_and_sign_out() {
    let gateway = MemoryAuthGateway::new();
    gateway.register("alice@example.com", "hunter22");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = gateway.on_session_change(Arc::new(move |signal: &Result<AuthChange, crate::error::SubscriptionError>| {
        if let Ok(change) = signal {
            sink.lock().unwrap().push(change.event);
        }
    }));

    gateway.sign_in_with_password("alice@example.com", "hunter22").await.unwrap();
    gateway.refresh_token();
    gateway.sign_out().await.unwrap();
    gateway.refresh_token();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![AuthEvent::SignedIn, AuthEvent::TokenRefreshed, AuthEvent::SignedOut]
    );
}

// =============================================================================
// MemoryVisitStore: CRUD as seen by one owner
// =============================================================================

#[tokio::test]
async fn create_then_list_returns_stored_record() {
    let store = MemoryVisitStore::new();
    let alice = Identity { id: Uuid::new_v4(), email: None };
    let repo = store.repository_for(Some(&alice));

    let created = repo.create(joes_pizza(&alice)).await.unwrap();
    let listed = repo.list(alice.id).await.unwrap();

    assert_eq!(listed.len(), 1);
    let visit = &listed[0];
    assert_eq!(visit, &created);
    assert_eq!(visit.restaurant_name, "Joe's Pizza");
    assert_eq!(visit.visited_on, date!(2024 - 01 - 15));
    assert!(visit.notes.is_none());
    assert_eq!(visit.owner_id, alice.id);
    assert!(!visit.id.is_nil());
    assert_eq!(visit.created_at, visit.updated_at);
}

#[tokio::test]
async fn editing_notes_bumps_updated_at() {
    let store = MemoryVisitStore::new();
    let alice = Identity { id: Uuid::new_v4(), email: None };
    let repo = store.repository_for(Some(&alice));
    let created = repo.create(joes_pizza(&alice)).await.unwrap();

    let patch = VisitPatch { notes: Some(Some("Great crust".into())), ..VisitPatch::default() };
    repo.update(created.id, patch).await.unwrap();

    let listed = repo.list(alice.id).await.unwrap();
    assert_eq!(listed[0].notes.as_deref(), Some("Great crust"));
    assert_eq!(listed[0].restaurant_name, "Joe's Pizza");
    assert!(listed[0].updated_at > listed[0].created_at);
    assert_eq!(listed[0].created_at, created.created_at);
}

#[tokio::test]
async fn delete_removes_only_the_owners_row() {
    let store = MemoryVisitStore::new();
    let alice = Identity { id: Uuid::new_v4(), email: None };
    let bob = Identity { id: Uuid::new_v4(), email: None };
    let alice_repo = store.repository_for(Some(&alice));
    let bob_repo = store.repository_for(Some(&bob));

    let hers = alice_repo.create(joes_pizza(&alice)).await.unwrap();
    bob_repo.create(joes_pizza(&bob)).await.unwrap();

    alice_repo.delete(hers.id).await.unwrap();

    assert!(alice_repo.list(alice.id).await.unwrap().is_empty());
    assert_eq!(bob_repo.list(bob.id).await.unwrap().len(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn list_is_sorted_newest_first() {
    let store = MemoryVisitStore::new();
    let alice = Identity { id: Uuid::new_v4(), email: None };
    let repo = store.repository_for(Some(&alice));
    for (name, day) in [("a", date!(2024 - 01 - 01)), ("c", date!(2024 - 03 - 01)), ("b", date!(2024 - 02 - 01))] {
        let mut visit = joes_pizza(&alice);
        visit.restaurant_name = name.into();
        visit.visited_on = day;
        repo.create(visit).await.unwrap();
    }
    let names: Vec<String> = repo
        .list(alice.id)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.restaurant_name)
        .collect();
    assert_eq!(names, ["c", "b", "a"]);
}

// =============================================================================
// MemoryVisitStore: ownership enforcement
// =============================================================================

#[tokio::test]
async fn anonymous_caller_is_unauthenticated() {
    let store = MemoryVisitStore::new();
    let repo = store.repository_for(None);
    assert_eq!(repo.list(Uuid::new_v4()).await.unwrap_err(), RemoteError::Unauthenticated);
}

#[tokio::test]
async fn reading_someone_elses_visits_is_forbidden() {
    let store = MemoryVisitStore::new();
    let alice = Identity { id: Uuid::new_v4(), email: None };
    let repo = store.repository_for(Some(&alice));
    assert!(matches!(repo.list(Uuid::new_v4()).await, Err(RemoteError::Forbidden(_))));
}

#[tokio::test]
async fn inserting_for_another_owner_is_forbidden() {
    let store = MemoryVisitStore::new();
    let alice = Identity { id: Uuid::new_v4(), email: None };
    let bob = Identity { id: Uuid::new_v4(), email: None };
    let repo = store.repository_for(Some(&alice));

    let err = repo.create(joes_pizza(&bob)).await.unwrap_err();
    assert!(err.to_string().contains("row-level security"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn touching_another_owners_row_is_an_error_not_a_no_op() {
    let store = MemoryVisitStore::new();
    let alice = Identity { id: Uuid::new_v4(), email: None };
    let bob = Identity { id: Uuid::new_v4(), email: None };
    let hers = store
        .repository_for(Some(&alice))
        .create(joes_pizza(&alice))
        .await
        .unwrap();
    let bob_repo = store.repository_for(Some(&bob));

    let patch = VisitPatch { notes: Some(Some("mine now".into())), ..VisitPatch::default() };
    assert_eq!(bob_repo.update(hers.id, patch).await.unwrap_err(), RemoteError::NotFound(hers.id));
    assert_eq!(bob_repo.delete(hers.id).await.unwrap_err(), RemoteError::NotFound(hers.id));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn blank_restaurant_name_is_rejected() {
    let store = MemoryVisitStore::new();
    let alice = Identity { id: Uuid::new_v4(), email: None };
    let repo = store.repository_for(Some(&alice));
    let mut visit = joes_pizza(&alice);
    visit.restaurant_name = "   ".into();
    assert!(matches!(repo.create(visit).await, Err(RemoteError::Rejected(_))));
}
