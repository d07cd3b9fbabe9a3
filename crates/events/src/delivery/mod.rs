//! Concrete outbound delivery channels.

pub mod email;
pub mod notification;
