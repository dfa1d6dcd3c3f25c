//! Dashboard Controller state bound to a signal.

use diary::dashboard::{DashboardCell, DashboardState};
use leptos::prelude::*;
use time::Date;

#[derive(Clone, Copy)]
pub struct DashboardHandle(pub RwSignal<DashboardState>);

impl DashboardHandle {
    pub fn new(today: Date) -> Self {
        Self(RwSignal::new(DashboardState::new(today)))
    }

    /// Read a projection of the state, tracked.
    pub fn with<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        self.0.with(f)
    }

    pub fn update(&self, f: impl FnOnce(&mut DashboardState)) {
        self.0.update(f);
    }
}

impl DashboardCell for DashboardHandle {
    fn update_dashboard<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> Option<R> {
        self.0.try_update(f)
    }
}
