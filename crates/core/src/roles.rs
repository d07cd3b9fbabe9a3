//! Role name constants shared across the auth and dispatch layers.

/// Platform administrators: match bookings, manage offers, delete bookings.
pub const ROLE_ADMIN: &str = "admin";

/// Pet owners: create bookings, accept offers, confirm assignments.
pub const ROLE_OWNER: &str = "owner";

/// Caregivers: passive recipients of assignments in this core; their own
/// accept/decline UX lives in a separate service.
pub const ROLE_CAREGIVER: &str = "caregiver";
