//! Pawhub domain core.
//!
//! Pure domain logic shared by the repository layer, the dispatch engine,
//! and the HTTP surface. This crate has zero internal dependencies so it
//! can be used by any future worker or CLI tooling.

pub mod booking;
pub mod error;
pub mod roles;
pub mod slot;
pub mod submission;
pub mod types;
