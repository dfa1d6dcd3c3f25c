//! Route Guard: which page may be shown for the current session.
//!
//! The guard is a pure function of `(SessionState, Page)`. Views re-evaluate
//! it whenever the session changes and perform the navigation it asks for.
//!
//! States:
//!
//! | session                    | page             | decision            |
//! |----------------------------|------------------|---------------------|
//! | loading                    | any              | show loading, stay  |
//! | signed out                 | `/` `/dashboard` | go to `/auth`       |
//! | signed out                 | `/auth`          | render              |
//! | signed in                  | `/` `/auth`      | go to `/dashboard`  |
//! | signed in                  | `/dashboard`     | render              |

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::session::SessionState;

/// The three addressable pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Page {
    Entry,
    Auth,
    Dashboard,
}

impl Page {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Entry => "/",
            Self::Auth => "/auth",
            Self::Dashboard => "/dashboard",
        }
    }

    /// Whether a signed-out visitor must be sent to `/auth`.
    /// The entry page only forwards, so it counts as protected.
    #[must_use]
    pub fn requires_auth(self) -> bool {
        !matches!(self, Self::Auth)
    }

    /// Pages a signed-in user is forwarded away from.
    #[must_use]
    pub fn is_gate(self) -> bool {
        matches!(self, Self::Entry | Self::Auth)
    }
}

/// Guard state machine position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Unauthenticated,
    /// Signed in, looking at the entry or auth page.
    AuthenticatedAtGate,
    /// Signed in, looking at a protected page.
    AuthenticatedProtected,
}

/// What the view should do right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    ShowLoading,
    Redirect(Page),
    Render,
}

impl GuardDecision {
    /// Page to navigate to, if any.
    #[must_use]
    pub fn redirect(self) -> Option<Page> {
        match self {
            Self::Redirect(page) => Some(page),
            Self::ShowLoading | Self::Render => None,
        }
    }
}

#[must_use]
pub fn classify(session: &SessionState, page: Page) -> GuardState {
    if session.is_loading {
        GuardState::Loading
    } else if session.identity.is_none() {
        GuardState::Unauthenticated
    } else if page.is_gate() {
        GuardState::AuthenticatedAtGate
    } else {
        GuardState::AuthenticatedProtected
    }
}

#[must_use]
pub fn decide(session: &SessionState, page: Page) -> GuardDecision {
    match classify(session, page) {
        GuardState::Loading => GuardDecision::ShowLoading,
        GuardState::Unauthenticated if page.requires_auth() => GuardDecision::Redirect(Page::Auth),
        GuardState::AuthenticatedAtGate => GuardDecision::Redirect(Page::Dashboard),
        GuardState::Unauthenticated | GuardState::AuthenticatedProtected => GuardDecision::Render,
    }
}
