//! Reactive bindings of the `diary` state machines.
//!
//! DESIGN
//! ======
//! Each handle wraps one `RwSignal` holding a plain `diary` value and
//! implements the matching cell trait, so the framework-free sequencing in
//! `diary` drives the signals directly. Handles are `Copy` and travel
//! through Leptos context.

pub mod dashboard;
pub mod session;
