//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page wraps itself in `RouteGuard`, owns route-scoped orchestration,
//! and delegates rendering details to `components`.

pub mod auth;
pub mod dashboard;
pub mod home;
