//! Error taxonomy shared by the gateway, repository, and dashboard.
//!
//! ERROR HANDLING
//! ==============
//! Every variant renders to a message fit for inline display. Nothing here is
//! fatal: callers show the text and leave the UI in a re-enterable state.

use uuid::Uuid;

/// Failure talking to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The provider refused the request (bad credentials, weak password, ...).
    /// Carries the provider's own message.
    #[error("{0}")]
    Rejected(String),
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    /// The provider answered with something we could not decode.
    #[error("unexpected auth response: {0}")]
    Decode(String),
}

/// Failure reported by the remote record store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The store rejected the request; carries its message.
    #[error("{0}")]
    Rejected(String),
    /// Row-level security denied access to another identity's rows.
    #[error("not permitted: {0}")]
    Forbidden(String),
    /// No row matched the id for the requesting identity.
    #[error("visit {0} not found")]
    NotFound(Uuid),
    /// No identity is attached to the request.
    #[error("not signed in")]
    Unauthenticated,
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Failure of the auth-state change stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("auth event stream closed: {0}")]
    Closed(String),
}

/// Visit form input that cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Restaurant name is required")]
    RestaurantNameRequired,
    #[error("Visit date must look like YYYY-MM-DD: {0}")]
    InvalidDate(String),
    #[error("Visit date cannot be in the future")]
    FutureDate,
    #[error("Sign in before saving visits")]
    NotSignedIn,
}
