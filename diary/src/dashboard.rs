//! Dashboard Controller: form state, list state, and write sequencing.
//!
//! DESIGN
//! ======
//! `DashboardState` is a plain value with `begin_*`/`finish_*` pairs around
//! each repository call. The `begin_*` half validates and marks the request
//! in flight; the `finish_*` half folds the result back in and says whether
//! the list should be re-fetched. The async helpers at the bottom glue the
//! halves to a `VisitRepository` through a `DashboardCell`, the same way
//! `session::bootstrap` drives a `SessionCell`.
//!
//! List fetches are numbered so a slow response cannot overwrite a newer one.
//!
//! ERROR HANDLING
//! ==============
//! Failures become a `Notice` on the state. The form keeps its contents on
//! a failed submit so the user can fix and resend.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use time::Date;
use uuid::Uuid;

use crate::error::{RemoteError, ValidationError};
use crate::model::{Identity, NewVisit, Visit, VisitPatch, format_iso_date, parse_iso_date};
use crate::repository::VisitRepository;

// =============================================================================
// FORM
// =============================================================================

/// Raw form fields, exactly as typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitForm {
    pub restaurant_name: String,
    /// `YYYY-MM-DD`, as produced by a date input.
    pub visited_on: String,
    pub notes: String,
}

/// Form contents that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitFields {
    pub restaurant_name: String,
    pub visited_on: Date,
    pub notes: Option<String>,
}

impl VisitForm {
    /// Empty form dated `today`.
    #[must_use]
    pub fn blank(today: Date) -> Self {
        Self { restaurant_name: String::new(), visited_on: format_iso_date(today), notes: String::new() }
    }

    /// Form pre-filled for editing `visit`.
    #[must_use]
    pub fn from_visit(visit: &Visit) -> Self {
        Self {
            restaurant_name: visit.restaurant_name.clone(),
            visited_on: format_iso_date(visit.visited_on),
            notes: visit.notes.clone().unwrap_or_default(),
        }
    }

    /// Check the fields. Names are trimmed, blank notes become `None`.
    ///
    /// # Errors
    ///
    /// Fails on a blank name, a malformed date, or a date after `today`.
    pub fn validate(&self, today: Date) -> Result<VisitFields, ValidationError> {
        let restaurant_name = self.restaurant_name.trim();
        if restaurant_name.is_empty() {
            return Err(ValidationError::RestaurantNameRequired);
        }
        let visited_on = parse_iso_date(&self.visited_on)?;
        if visited_on > today {
            return Err(ValidationError::FutureDate);
        }
        let notes = self.notes.trim();
        Ok(VisitFields {
            restaurant_name: restaurant_name.to_owned(),
            visited_on,
            notes: (!notes.is_empty()).then(|| notes.to_owned()),
        })
    }
}

impl VisitFields {
    #[must_use]
    pub fn into_new_visit(self, owner_id: Uuid) -> NewVisit {
        NewVisit {
            owner_id,
            restaurant_name: self.restaurant_name,
            visited_on: self.visited_on,
            notes: self.notes,
        }
    }

    /// Full replacement of the editable fields, clearing notes when blank.
    #[must_use]
    pub fn into_patch(self) -> VisitPatch {
        VisitPatch {
            restaurant_name: Some(self.restaurant_name),
            visited_on: Some(self.visited_on),
            notes: Some(self.notes),
        }
    }
}

// =============================================================================
// NOTICES AND WRITES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Inline status line under the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Repository write a submit resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VisitWrite {
    Create(NewVisit),
    Update { id: Uuid, patch: VisitPatch },
}

impl VisitWrite {
    #[must_use]
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update { .. })
    }

    /// Send the write.
    ///
    /// # Errors
    ///
    /// Whatever the repository reports.
    pub async fn execute(self, repo: &dyn VisitRepository) -> Result<Visit, RemoteError> {
        match self {
            Self::Create(visit) => repo.create(visit).await,
            Self::Update { id, patch } => repo.update(id, patch).await,
        }
    }
}

/// Numbers one list fetch.
#[derive(Debug, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

/// Summary shown in the stats card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisitStats {
    pub visits: usize,
    /// Distinct restaurant names, ignoring case and surrounding whitespace.
    pub restaurants: usize,
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardState {
    pub visits: Vec<Visit>,
    /// A list fetch is outstanding.
    pub loading: bool,
    /// A create or update is outstanding.
    pub submitting: bool,
    /// `editing_id` as it was when the outstanding submit began.
    submitted_edit: Option<Uuid>,
    pub form: VisitForm,
    /// Visit the form currently edits; `None` means the form creates.
    pub editing_id: Option<Uuid>,
    /// Visit awaiting delete confirmation; stays set while the confirmed
    /// delete is outstanding.
    pub pending_delete: Option<Uuid>,
    /// A confirmed delete is outstanding.
    pub deleting: bool,
    pub notice: Option<Notice>,
    refresh_generation: u64,
}

impl DashboardState {
    /// Fresh dashboard: empty list, loading, blank form dated `today`.
    #[must_use]
    pub fn new(today: Date) -> Self {
        Self {
            visits: Vec::new(),
            loading: true,
            submitting: false,
            submitted_edit: None,
            form: VisitForm::blank(today),
            editing_id: None,
            pending_delete: None,
            deleting: false,
            notice: None,
            refresh_generation: 0,
        }
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    #[must_use]
    pub fn visit(&self, id: Uuid) -> Option<&Visit> {
        self.visits.iter().find(|visit| visit.id == id)
    }

    #[must_use]
    pub fn stats(&self) -> VisitStats {
        let restaurants: HashSet<String> = self
            .visits
            .iter()
            .map(|visit| visit.restaurant_name.trim().to_lowercase())
            .collect();
        VisitStats { visits: self.visits.len(), restaurants: restaurants.len() }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // -- list -----------------------------------------------------------------

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.refresh_generation += 1;
        self.loading = true;
        RefreshTicket { generation: self.refresh_generation }
    }

    /// Fold in a list fetch. A failure keeps the previous list.
    ///
    /// Returns `false` when a newer fetch was started after this one.
    pub fn finish_refresh(&mut self, ticket: RefreshTicket, result: Result<Vec<Visit>, RemoteError>) -> bool {
        if ticket.generation != self.refresh_generation {
            log::debug!("dropping superseded visit list (generation {})", ticket.generation);
            return false;
        }
        self.loading = false;
        match result {
            Ok(visits) => self.visits = visits,
            Err(err) => {
                log::error!("failed to load visits: {err}");
                self.notice = Some(Notice::error("Failed to load visits"));
            }
        }
        true
    }

    // -- submit ---------------------------------------------------------------

    /// Validate the form and pick the write it stands for.
    ///
    /// Returns `None`, leaving an error notice, when the form is invalid or
    /// nobody is signed in. Also `None`, silently, while a submit is already
    /// outstanding.
    pub fn begin_submit(&mut self, owner: Option<&Identity>, today: Date) -> Option<VisitWrite> {
        if self.submitting {
            return None;
        }
        let checked = owner
            .ok_or(ValidationError::NotSignedIn)
            .and_then(|owner| self.form.validate(today).map(|fields| (owner.id, fields)));
        let (owner_id, fields) = match checked {
            Ok(ok) => ok,
            Err(err) => {
                self.notice = Some(Notice::error(err.to_string()));
                return None;
            }
        };
        self.submitting = true;
        self.submitted_edit = self.editing_id;
        self.notice = None;
        Some(match self.editing_id {
            Some(id) => VisitWrite::Update { id, patch: fields.into_patch() },
            None => VisitWrite::Create(fields.into_new_visit(owner_id)),
        })
    }

    /// Fold in the result of the write from `begin_submit`.
    ///
    /// On success the form resets and edit mode ends, unless the user moved
    /// on to editing another visit meanwhile; returns `true` so the caller
    /// re-fetches the list. On failure the form is left untouched.
    pub fn finish_submit(&mut self, was_update: bool, result: Result<Visit, RemoteError>, today: Date) -> bool {
        self.submitting = false;
        let submitted_edit = self.submitted_edit.take();
        match result {
            Ok(visit) => {
                log::info!("saved visit {} ({})", visit.id, visit.restaurant_name);
                self.notice = Some(Notice::success(if was_update { "Visit updated!" } else { "Visit added!" }));
                if self.editing_id == submitted_edit {
                    self.form = VisitForm::blank(today);
                    self.editing_id = None;
                }
                true
            }
            Err(err) => {
                log::error!("error saving visit: {err}");
                self.notice = Some(Notice::error(err.to_string()));
                false
            }
        }
    }

    // -- edit -----------------------------------------------------------------

    /// Load visit `id` into the form. Returns `false` if it is not listed.
    pub fn begin_edit(&mut self, id: Uuid) -> bool {
        let Some(form) = self.visit(id).map(VisitForm::from_visit) else {
            return false;
        };
        self.form = form;
        self.editing_id = Some(id);
        self.notice = None;
        true
    }

    pub fn cancel_edit(&mut self, today: Date) {
        self.editing_id = None;
        self.form = VisitForm::blank(today);
    }

    // -- delete ---------------------------------------------------------------

    /// Ask for confirmation before deleting `id`. Returns `false` if it is
    /// not listed.
    pub fn request_delete(&mut self, id: Uuid) -> bool {
        if self.deleting || self.visit(id).is_none() {
            return false;
        }
        self.pending_delete = Some(id);
        true
    }

    /// Dismiss the confirmation. Ignored once the delete is under way.
    pub fn cancel_delete(&mut self) {
        if !self.deleting {
            self.pending_delete = None;
        }
    }

    /// The user confirmed. Hands back the id to delete, if one was pending.
    pub fn confirm_delete(&mut self) -> Option<Uuid> {
        if self.deleting {
            return None;
        }
        let id = self.pending_delete?;
        self.deleting = true;
        Some(id)
    }

    /// Fold in a delete result. Returns `true` when the list should be
    /// re-fetched.
    pub fn finish_delete(&mut self, id: Uuid, result: Result<(), RemoteError>, today: Date) -> bool {
        self.deleting = false;
        self.pending_delete = None;
        match result {
            Ok(()) => {
                log::info!("deleted visit {id}");
                self.visits.retain(|visit| visit.id != id);
                if self.editing_id == Some(id) {
                    self.cancel_edit(today);
                }
                self.notice = Some(Notice::success("Visit deleted"));
                true
            }
            Err(err) => {
                log::error!("error deleting visit {id}: {err}");
                self.notice = Some(Notice::error("Failed to delete visit"));
                false
            }
        }
    }
}

// =============================================================================
// SEQUENCING
// =============================================================================

/// Shared, mutable home of a `DashboardState`.
///
/// Like `SessionCell`, returns `None` once the owning view is gone.
pub trait DashboardCell: Clone + 'static {
    fn update_dashboard<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> Option<R>;
}

impl DashboardCell for Arc<Mutex<DashboardState>> {
    fn update_dashboard<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> Option<R> {
        let mut state = self.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut state))
    }
}

/// Fetch `owner_id`'s visits into `cell`.
pub async fn refresh<C: DashboardCell>(cell: &C, repo: &dyn VisitRepository, owner_id: Uuid) {
    let Some(ticket) = cell.update_dashboard(DashboardState::begin_refresh) else {
        return;
    };
    let result = repo.list(owner_id).await;
    cell.update_dashboard(|state| state.finish_refresh(ticket, result));
}

/// Submit the form: write, then re-fetch on success.
pub async fn submit<C: DashboardCell>(cell: &C, repo: &dyn VisitRepository, owner: Option<&Identity>, today: Date) {
    let Some(Some(write)) = cell.update_dashboard(|state| state.begin_submit(owner, today)) else {
        return;
    };
    let was_update = write.is_update();
    let result = write.execute(repo).await;
    let reload = cell
        .update_dashboard(|state| state.finish_submit(was_update, result, today))
        .unwrap_or(false);
    if let (true, Some(owner)) = (reload, owner) {
        refresh(cell, repo, owner.id).await;
    }
}

/// Delete the visit awaiting confirmation, then re-fetch on success.
pub async fn confirm_delete<C: DashboardCell>(cell: &C, repo: &dyn VisitRepository, owner_id: Uuid, today: Date) {
    let Some(Some(id)) = cell.update_dashboard(DashboardState::confirm_delete) else {
        return;
    };
    let result = repo.delete(id).await;
    let reload = cell
        .update_dashboard(|state| state.finish_delete(id, result, today))
        .unwrap_or(false);
    if reload {
        refresh(cell, repo, owner_id).await;
    }
}
