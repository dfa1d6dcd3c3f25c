//! Networking modules for the hosted backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` implements the `AuthGateway` against Supabase GoTrue, `visits`
//! implements the `VisitRepository` against PostgREST, and `supabase` holds
//! the shared wire schema, endpoints, and error mapping.

pub mod auth;
#[cfg(any(test, feature = "hydrate"))]
pub(crate) mod supabase;
pub mod visits;
