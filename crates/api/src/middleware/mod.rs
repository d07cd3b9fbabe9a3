//! Request-level middleware: authentication extractors, RBAC, rate limiting.

pub mod auth;
pub mod rate_limit;
pub mod rbac;
