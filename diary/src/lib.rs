//! # diary
//!
//! Framework-free core of the eatin restaurant diary.
//!
//! SYSTEM CONTEXT
//! ==============
//! Authentication and persistence live in a hosted backend. This crate owns
//! everything the client decides for itself: who is signed in right now
//! (`session`), which page may be shown (`guard`), and how the dashboard
//! sequences visit writes (`dashboard`). The backend is reached only through
//! the `AuthGateway` and `VisitRepository` traits, so the Leptos client,
//! tests, and local runs can plug in different implementations.

pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod memory;
pub mod model;
pub mod repository;
pub mod session;

pub use error::{AuthError, RemoteError, SubscriptionError, ValidationError};
pub use gateway::{AuthChange, AuthEvent, AuthEventHub, AuthGateway, SignUpOutcome, Subscription};
pub use guard::{GuardDecision, GuardState, Page};
pub use model::{Identity, NewVisit, Session, Visit, VisitPatch};
pub use repository::VisitRepository;
pub use session::{SessionCell, SessionState, SessionStore, SessionSync};
