//! The dispatch engine: booking transitions and their side-effect fan-out.
//!
//! Every lifecycle operation goes through [`dispatch`]: load the booking,
//! authorize, re-check the slot, apply the closed transition table, and
//! commit the state change together with the outbound task enqueue in one
//! transaction. [`effects`] builds the per-transition notification and email
//! payload sets.

pub mod dispatch;
pub mod effects;

pub use dispatch::DispatchEngine;
