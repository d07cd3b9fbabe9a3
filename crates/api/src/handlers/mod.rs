//! HTTP request handlers, grouped by resource.

pub mod admin_booking;
pub mod booking;
pub mod notification;
