//! Row structs (`FromRow`) and request DTOs, one module per table.

pub mod booking;
pub mod conversation;
pub mod notification;
pub mod offer;
pub mod outbox;
pub mod user;
