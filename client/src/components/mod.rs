//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render dashboard chrome and the visit surfaces. They read the
//! `DashboardHandle` passed in by the page and report user intent back
//! through `Callback`s; none of them talks to the backend directly.

pub mod confirm_dialog;
pub mod site_header;
pub mod visit_card;
pub mod visit_form;
