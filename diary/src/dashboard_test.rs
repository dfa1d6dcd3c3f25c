use super::*;
use crate::memory::MemoryVisitStore;
use time::macros::{date, datetime};

const TODAY: Date = date!(2024 - 03 - 10);

fn owner() -> Identity {
    Identity { id: Uuid::new_v4(), email: Some("alice@example.com".into()) }
}

fn visit(owner_id: Uuid, name: &str, on: Date) -> Visit {
    Visit {
        id: Uuid::new_v4(),
        owner_id,
        restaurant_name: name.into(),
        visited_on: on,
        notes: Some("tasty".into()),
        created_at: datetime!(2024-03-01 12:00 UTC),
        updated_at: datetime!(2024-03-01 12:00 UTC),
    }
}

fn filled(name: &str, on: &str, notes: &str) -> VisitForm {
    VisitForm { restaurant_name: name.into(), visited_on: on.into(), notes: notes.into() }
}

fn listed(visits: Vec<Visit>) -> DashboardState {
    let mut state = DashboardState::new(TODAY);
    let ticket = state.begin_refresh();
    state.finish_refresh(ticket, Ok(visits));
    state
}

// =============================================================================
// VisitForm
// =============================================================================

#[test]
fn blank_form_defaults_to_today() {
    assert_eq!(VisitForm::blank(TODAY), filled("", "2024-03-10", ""));
}

#[test]
fn validate_trims_and_nulls_blank_notes() {
    let fields = filled("  Joe's Pizza ", "2024-01-15", "   ").validate(TODAY).unwrap();
    assert_eq!(fields.restaurant_name, "Joe's Pizza");
    assert_eq!(fields.visited_on, date!(2024 - 01 - 15));
    assert_eq!(fields.notes, None);
}

#[test]
fn validate_rejects_blank_name() {
    assert_eq!(
        filled("  ", "2024-01-15", "").validate(TODAY),
        Err(ValidationError::RestaurantNameRequired)
    );
}

#[test]
fn validate_rejects_bad_and_future_dates() {
    assert!(matches!(
        filled("Joe's", "15/01/2024", "").validate(TODAY),
        Err(ValidationError::InvalidDate(_))
    ));
    assert_eq!(filled("Joe's", "2024-03-11", "").validate(TODAY), Err(ValidationError::FutureDate));
    assert!(filled("Joe's", "2024-03-10", "").validate(TODAY).is_ok());
}

#[test]
fn from_visit_round_trips_through_validate() {
    let original = visit(Uuid::new_v4(), "Chez Panisse", date!(2023 - 12 - 24));
    let fields = VisitForm::from_visit(&original).validate(TODAY).unwrap();
    assert_eq!(fields.restaurant_name, original.restaurant_name);
    assert_eq!(fields.visited_on, original.visited_on);
    assert_eq!(fields.notes, original.notes);
}

#[test]
fn patch_from_fields_clears_notes_explicitly() {
    let patch = filled("Joe's", "2024-01-15", "").validate(TODAY).unwrap().into_patch();
    assert_eq!(patch.notes, Some(None));
    assert!(!patch.is_empty());
}

// =============================================================================
// list
// =============================================================================

#[test]
fn refresh_failure_keeps_previous_list() {
    let id = Uuid::new_v4();
    let mut state = listed(vec![visit(id, "A", TODAY)]);

    let ticket = state.begin_refresh();
    assert!(state.loading);
    state.finish_refresh(ticket, Err(RemoteError::Network("offline".into())));

    assert!(!state.loading);
    assert_eq!(state.visits.len(), 1);
    assert_eq!(state.notice, Some(Notice::error("Failed to load visits")));
}

#[test]
fn superseded_refresh_is_dropped() {
    let id = Uuid::new_v4();
    let mut state = DashboardState::new(TODAY);
    let old = state.begin_refresh();
    let new = state.begin_refresh();

    assert!(state.finish_refresh(new, Ok(vec![visit(id, "new", TODAY)])));
    assert!(!state.finish_refresh(old, Ok(Vec::new())));
    assert_eq!(state.visits[0].restaurant_name, "new");
}

#[test]
fn stats_count_visits_and_distinct_restaurants() {
    let id = Uuid::new_v4();
    let state = listed(vec![
        visit(id, "Joe's Pizza", TODAY),
        visit(id, "joe's pizza ", date!(2024 - 01 - 01)),
        visit(id, "Sushi Bar", date!(2024 - 02 - 01)),
    ]);
    assert_eq!(state.stats(), VisitStats { visits: 3, restaurants: 2 });
}

// =============================================================================
// submit
// =============================================================================

#[test]
fn submit_without_owner_is_refused() {
    let mut state = DashboardState::new(TODAY);
    state.form = filled("Joe's", "2024-01-15", "");
    assert_eq!(state.begin_submit(None, TODAY), None);
    assert!(state.notice.as_ref().is_some_and(Notice::is_error));
    assert!(!state.submitting);
}

#[test]
fn invalid_form_sets_error_and_stays_idle() {
    let who = owner();
    let mut state = DashboardState::new(TODAY);
    assert_eq!(state.begin_submit(Some(&who), TODAY), None);
    assert_eq!(state.notice, Some(Notice::error("Restaurant name is required")));
    assert!(!state.submitting);
}

#[test]
fn submit_creates_when_not_editing() {
    let who = owner();
    let mut state = DashboardState::new(TODAY);
    state.form = filled("Joe's Pizza", "2024-01-15", "");

    let write = state.begin_submit(Some(&who), TODAY).unwrap();
    assert!(state.submitting);
    assert_eq!(
        write,
        VisitWrite::Create(NewVisit {
            owner_id: who.id,
            restaurant_name: "Joe's Pizza".into(),
            visited_on: date!(2024 - 01 - 15),
            notes: None,
        })
    );
    assert_eq!(state.begin_submit(Some(&who), TODAY), None, "second submit while in flight");
}

#[test]
fn submit_updates_while_editing() {
    let who = owner();
    let existing = visit(who.id, "Joe's", date!(2024 - 01 - 15));
    let id = existing.id;
    let mut state = listed(vec![existing]);

    assert!(state.begin_edit(id));
    state.form.notes = "Great crust".into();
    let write = state.begin_submit(Some(&who), TODAY).unwrap();

    let VisitWrite::Update { id: target, patch } = write else {
        panic!("expected update");
    };
    assert_eq!(target, id);
    assert_eq!(patch.notes, Some(Some("Great crust".into())));
}

#[test]
fn successful_submit_resets_form_and_asks_for_refresh() {
    let who = owner();
    let existing = visit(who.id, "Joe's", date!(2024 - 01 - 15));
    let mut state = listed(vec![existing.clone()]);
    state.begin_edit(existing.id);
    state.begin_submit(Some(&who), TODAY).unwrap();

    assert!(state.finish_submit(true, Ok(existing), TODAY));
    assert_eq!(state.form, VisitForm::blank(TODAY));
    assert!(!state.is_editing());
    assert!(!state.submitting);
    assert_eq!(state.notice, Some(Notice::success("Visit updated!")));
}

#[test]
fn edit_started_during_create_survives_its_completion() {
    let who = owner();
    let existing = visit(who.id, "Sushi Bar", date!(2024 - 02 - 29));
    let id = existing.id;
    let mut state = listed(vec![existing]);
    state.form = filled("Joe's Pizza", "2024-01-15", "");
    state.begin_submit(Some(&who), TODAY).unwrap();

    assert!(state.begin_edit(id));
    let created = visit(who.id, "Joe's Pizza", date!(2024 - 01 - 15));
    assert!(state.finish_submit(false, Ok(created), TODAY));

    assert_eq!(state.editing_id, Some(id));
    assert_eq!(state.form, filled("Sushi Bar", "2024-02-29", "tasty"));
    assert_eq!(state.notice, Some(Notice::success("Visit added!")));
}

#[test]
fn dismissed_notice_is_cleared() {
    let mut state = DashboardState::new(TODAY);
    state.begin_submit(None, TODAY);
    assert!(state.notice.as_ref().is_some_and(Notice::is_error));

    state.dismiss_notice();
    assert_eq!(state.notice, None);
}

#[test]
fn failed_submit_preserves_form() {
    let who = owner();
    let mut state = DashboardState::new(TODAY);
    state.form = filled("Joe's Pizza", "2024-01-15", "cheesy");
    state.begin_submit(Some(&who), TODAY).unwrap();

    let err = RemoteError::Forbidden("new row violates row-level security policy".into());
    assert!(!state.finish_submit(false, Err(err.clone()), TODAY));

    assert_eq!(state.form, filled("Joe's Pizza", "2024-01-15", "cheesy"));
    assert_eq!(state.notice, Some(Notice::error(err.to_string())));
    assert!(!state.submitting);
}

// =============================================================================
// edit / delete
// =============================================================================

#[test]
fn edit_prefills_and_cancel_resets() {
    let existing = visit(Uuid::new_v4(), "Sushi Bar", date!(2024 - 02 - 29));
    let id = existing.id;
    let mut state = listed(vec![existing]);

    assert!(!state.begin_edit(Uuid::new_v4()));
    assert!(state.begin_edit(id));
    assert_eq!(state.form, filled("Sushi Bar", "2024-02-29", "tasty"));
    assert_eq!(state.editing_id, Some(id));

    state.cancel_edit(TODAY);
    assert_eq!(state.form, VisitForm::blank(TODAY));
    assert!(!state.is_editing());
}

#[test]
fn delete_needs_confirmation() {
    let existing = visit(Uuid::new_v4(), "Sushi Bar", TODAY);
    let id = existing.id;
    let mut state = listed(vec![existing]);

    assert_eq!(state.confirm_delete(), None, "nothing requested yet");
    assert!(state.request_delete(id));
    state.cancel_delete();
    assert_eq!(state.confirm_delete(), None, "cancelled");

    state.request_delete(id);
    assert_eq!(state.confirm_delete(), Some(id));
    assert!(state.deleting);
    assert_eq!(state.confirm_delete(), None, "already under way");
}

#[test]
fn confirmation_stays_open_until_delete_finishes() {
    let existing = visit(Uuid::new_v4(), "Sushi Bar", TODAY);
    let other = visit(Uuid::new_v4(), "Taco Stand", TODAY);
    let id = existing.id;
    let mut state = listed(vec![existing, other.clone()]);
    state.request_delete(id);
    state.confirm_delete();

    state.cancel_delete();
    assert_eq!(state.pending_delete, Some(id), "cancel ignored while deleting");
    assert!(!state.request_delete(other.id), "no second delete while one is outstanding");
    assert_eq!(state.pending_delete, Some(id));

    state.finish_delete(id, Ok(()), TODAY);
    assert_eq!(state.pending_delete, None);
    assert!(!state.deleting);
}

#[test]
fn deleting_the_edited_visit_leaves_edit_mode() {
    let existing = visit(Uuid::new_v4(), "Sushi Bar", TODAY);
    let id = existing.id;
    let mut state = listed(vec![existing]);
    state.begin_edit(id);
    state.request_delete(id);
    state.confirm_delete();

    assert!(state.finish_delete(id, Ok(()), TODAY));
    assert!(state.visits.is_empty());
    assert!(!state.is_editing());
    assert_eq!(state.form, VisitForm::blank(TODAY));
    assert_eq!(state.notice, Some(Notice::success("Visit deleted")));
}

#[test]
fn failed_delete_keeps_row() {
    let existing = visit(Uuid::new_v4(), "Sushi Bar", TODAY);
    let id = existing.id;
    let mut state = listed(vec![existing]);
    state.request_delete(id);
    state.confirm_delete();

    assert!(!state.finish_delete(id, Err(RemoteError::NotFound(id)), TODAY));
    assert_eq!(state.visits.len(), 1);
    assert!(!state.deleting);
    assert_eq!(state.notice, Some(Notice::error("Failed to delete visit")));
}

// =============================================================================
// sequencing against a repository
// =============================================================================

#[tokio::test]
async fn add_edit_delete_against_memory_store() {
    let store = MemoryVisitStore::new();
    let who = owner();
    let repo = store.repository_for(Some(&who));
    let cell = Arc::new(Mutex::new(DashboardState::new(TODAY)));

    refresh(&cell, &repo, who.id).await;
    assert!(cell.lock().unwrap().visits.is_empty());

    cell.lock().unwrap().form = filled("Joe's Pizza", "2024-01-15", "");
    submit(&cell, &repo, Some(&who), TODAY).await;
    let id = {
        let state = cell.lock().unwrap();
        assert_eq!(state.notice, Some(Notice::success("Visit added!")));
        assert_eq!(state.visits.len(), 1);
        assert_eq!(state.visits[0].notes, None);
        state.visits[0].id
    };

    {
        let mut state = cell.lock().unwrap();
        state.begin_edit(id);
        state.form.notes = "Great crust".into();
    }
    submit(&cell, &repo, Some(&who), TODAY).await;
    {
        let state = cell.lock().unwrap();
        assert_eq!(state.notice, Some(Notice::success("Visit updated!")));
        assert_eq!(state.visits[0].notes.as_deref(), Some("Great crust"));
        assert!(state.visits[0].updated_at > state.visits[0].created_at);
    }

    cell.lock().unwrap().request_delete(id);
    confirm_delete(&cell, &repo, who.id, TODAY).await;
    assert!(cell.lock().unwrap().visits.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn rejected_write_surfaces_as_notice() {
    let store = MemoryVisitStore::new();
    let who = owner();
    // Transport authenticated as nobody: the store refuses the insert.
    let repo = store.repository_for(None);
    let cell = Arc::new(Mutex::new(DashboardState::new(TODAY)));
    cell.lock().unwrap().form = filled("Joe's Pizza", "2024-01-15", "");

    submit(&cell, &repo, Some(&who), TODAY).await;

    let state = cell.lock().unwrap();
    assert_eq!(state.notice, Some(Notice::error("not signed in")));
    assert_eq!(state.form.restaurant_name, "Joe's Pizza");
    assert!(store.is_empty());
}
