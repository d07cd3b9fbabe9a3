//! Authentication primitives: JWT issuance and validation.

pub mod jwt;
