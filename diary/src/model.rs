//! Identity, session, and visit records.
//!
//! DESIGN
//! ======
//! Field names on the wire mirror the hosted `visits` table (`user_id`,
//! `visited_at`), while the Rust names say what the values mean. Calendar
//! dates travel as `YYYY-MM-DD`; timestamps as RFC 3339.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const LONG_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[weekday], [month repr:long] [day padding:none], [year]");

/// An authenticated principal as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned user id.
    pub id: Uuid,
    /// Email the account was registered with, if the provider shares it.
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    /// Email for display, falling back to the id.
    #[must_use]
    pub fn label(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Whether, and as whom, the client is currently authenticated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    Present(Identity),
    #[default]
    Absent,
}

impl Session {
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Present(identity) => Some(identity),
            Self::Absent => None,
        }
    }

    #[must_use]
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            Self::Present(identity) => Some(identity),
            Self::Absent => None,
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl From<Option<Identity>> for Session {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(Self::Absent, Self::Present)
    }
}

/// One diary entry, as stored by the record store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub restaurant_name: String,
    #[serde(rename = "visited_at")]
    pub visited_on: Date,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Visit {
    /// Visit date rendered like "Monday, January 15, 2024".
    #[must_use]
    pub fn display_date(&self) -> String {
        format_long_date(self.visited_on)
    }
}

/// Insert payload: a visit before the store assigns id and timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVisit {
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub restaurant_name: String,
    #[serde(rename = "visited_at")]
    pub visited_on: Date,
    pub notes: Option<String>,
}

/// Partial update. `None` leaves a field untouched; `notes: Some(None)`
/// clears the notes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    #[serde(rename = "visited_at", default, skip_serializing_if = "Option::is_none")]
    pub visited_on: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl VisitPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.restaurant_name.is_none() && self.visited_on.is_none() && self.notes.is_none()
    }

    /// Apply the set fields to `visit`. Timestamps are the store's business.
    pub fn apply_to(&self, visit: &mut Visit) {
        if let Some(name) = &self.restaurant_name {
            visit.restaurant_name.clone_from(name);
        }
        if let Some(date) = self.visited_on {
            visit.visited_on = date;
        }
        if let Some(notes) = &self.notes {
            visit.notes.clone_from(notes);
        }
    }
}

/// Listing order: newest `visited_on` first, then newest `created_at`.
#[must_use]
pub fn newest_first(a: &Visit, b: &Visit) -> Ordering {
    b.visited_on
        .cmp(&a.visited_on)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

pub fn sort_newest_first(visits: &mut [Visit]) {
    visits.sort_by(newest_first);
}

/// Parse a `YYYY-MM-DD` form value.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] when the value is not a calendar date.
pub fn parse_iso_date(raw: &str) -> Result<Date, ValidationError> {
    let raw = raw.trim();
    Date::parse(raw, ISO_DATE).map_err(|_| ValidationError::InvalidDate(raw.to_owned()))
}

/// Render a date as `YYYY-MM-DD` for form inputs.
#[must_use]
pub fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE).unwrap_or_else(|_| date.to_string())
}

#[must_use]
pub fn format_long_date(date: Date) -> String {
    date.format(LONG_DATE).unwrap_or_else(|_| date.to_string())
}
