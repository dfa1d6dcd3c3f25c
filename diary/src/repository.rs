//! Visit Repository: CRUD against the external record store.
//!
//! SYSTEM CONTEXT
//! ==============
//! Implementations act on behalf of whichever identity their transport is
//! authenticated as; the store enforces ownership. A request the store
//! refuses, including one that silently matched zero rows because of
//! row-level security, must come back as a `RemoteError`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RemoteError;
use crate::model::{NewVisit, Visit, VisitPatch};

#[async_trait(?Send)]
pub trait VisitRepository: Send + Sync {
    /// All visits of `owner_id`, newest `visited_on` first.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Visit>, RemoteError>;

    /// Insert a visit; the store assigns id and timestamps.
    async fn create(&self, visit: NewVisit) -> Result<Visit, RemoteError>;

    /// Apply `patch` to visit `id` and return the stored row.
    async fn update(&self, id: Uuid, patch: VisitPatch) -> Result<Visit, RemoteError>;

    async fn delete(&self, id: Uuid) -> Result<(), RemoteError>;
}
