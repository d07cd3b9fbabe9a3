//! Booking lifecycle: status/window/service enums and the closed
//! transition table.
//!
//! Every status change in the system goes through [`BookingAction::apply`].
//! Handlers never branch on field presence to decide whether a transition is
//! legal; an illegal (state, action, actor) combination fails here, at one
//! boundary, with a descriptive message.

use serde::{Deserialize, Serialize};

use crate::roles::{ROLE_ADMIN, ROLE_OWNER};

// ---------------------------------------------------------------------------
// BookingStatus
// ---------------------------------------------------------------------------

/// Stored booking lifecycle states.
///
/// Cancellation is not a stored state: an admin delete removes the row and
/// fans out cancellation notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Assigned,
    Confirmed,
    Completed,
    Archived,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Assigned => "assigned",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "assigned" => Some(BookingStatus::Assigned),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "archived" => Some(BookingStatus::Archived),
            _ => None,
        }
    }

    /// A caregiver occupies their slot only in these states.
    pub fn is_committed(self) -> bool {
        matches!(self, BookingStatus::Assigned | BookingStatus::Confirmed)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// Coarse part-of-day bucket used when no exact time is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Morning => "morning",
            TimeWindow::Afternoon => "afternoon",
            TimeWindow::Evening => "evening",
            TimeWindow::Night => "night",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "morning" => Some(TimeWindow::Morning),
            "afternoon" => Some(TimeWindow::Afternoon),
            "evening" => Some(TimeWindow::Evening),
            "night" => Some(TimeWindow::Night),
            _ => None,
        }
    }

    /// Canonical start-of-window time, used when no explicit time is given.
    pub fn default_start(self) -> chrono::NaiveTime {
        let (hour, minute) = match self {
            TimeWindow::Morning => (7, 0),
            TimeWindow::Afternoon => (12, 0),
            TimeWindow::Evening => (18, 0),
            TimeWindow::Night => (22, 0),
        };
        chrono::NaiveTime::from_hms_opt(hour, minute, 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ServiceType / ContactPreference
// ---------------------------------------------------------------------------

/// The service catalogue offered through the dispatch flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    DogWalking,
    HomeVisit,
    OvernightCare,
    Daycare,
}

impl ServiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::DogWalking => "dog_walking",
            ServiceType::HomeVisit => "home_visit",
            ServiceType::OvernightCare => "overnight_care",
            ServiceType::Daycare => "daycare",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dog_walking" => Some(ServiceType::DogWalking),
            "home_visit" => Some(ServiceType::HomeVisit),
            "overnight_care" => Some(ServiceType::OvernightCare),
            "daycare" => Some(ServiceType::Daycare),
            _ => None,
        }
    }
}

/// How the owner wants to be contacted about this booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPreference {
    Email,
    Phone,
    Sms,
}

impl ContactPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactPreference::Email => "email",
            ContactPreference::Phone => "phone",
            ContactPreference::Sms => "sms",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(ContactPreference::Email),
            "phone" => Some(ContactPreference::Phone),
            "sms" => Some(ContactPreference::Sms),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// An action an actor attempts against a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    /// Admin assigns a caregiver to a pending booking.
    AdminAssign,
    /// Owner accepts a candidate offer (skips `Assigned`).
    OwnerAcceptOffer,
    /// Owner confirms an admin-made assignment.
    OwnerConfirm,
    /// External fulfillment event marks the booking done.
    Complete,
    /// Explicit archival of a finished booking.
    Archive,
    /// Admin deletes the booking (cancellation).
    Delete,
}

impl BookingAction {
    fn as_str(self) -> &'static str {
        match self {
            BookingAction::AdminAssign => "assign",
            BookingAction::OwnerAcceptOffer => "accept offer",
            BookingAction::OwnerConfirm => "confirm",
            BookingAction::Complete => "complete",
            BookingAction::Archive => "archive",
            BookingAction::Delete => "delete",
        }
    }

    /// The role allowed to perform this action.
    fn required_role(self) -> &'static str {
        match self {
            BookingAction::AdminAssign
            | BookingAction::Complete
            | BookingAction::Archive
            | BookingAction::Delete => ROLE_ADMIN,
            BookingAction::OwnerAcceptOffer | BookingAction::OwnerConfirm => ROLE_OWNER,
        }
    }
}

/// The outcome of a legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The booking moves to a new stored status.
    To(BookingStatus),
    /// The booking row is removed (cancellation).
    Remove,
}

/// Why a transition was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The acting role may never perform this action.
    #[error("Role '{role}' may not {action} a booking")]
    Forbidden { role: String, action: &'static str },

    /// The action is not legal from the current status.
    #[error("Cannot {action} a booking in status '{from}'")]
    Illegal {
        from: BookingStatus,
        action: &'static str,
    },
}

impl BookingAction {
    /// Resolve this action against the current status and acting role.
    ///
    /// Returns the resulting [`Transition`] or why it is rejected. This is
    /// the only place in the system that knows the lifecycle graph.
    pub fn apply(
        self,
        current: BookingStatus,
        role: &str,
    ) -> Result<Transition, TransitionError> {
        if role != self.required_role() {
            return Err(TransitionError::Forbidden {
                role: role.to_string(),
                action: self.as_str(),
            });
        }

        use BookingAction as A;
        use BookingStatus as S;
        let next = match (current, self) {
            (S::Pending, A::AdminAssign) => Transition::To(S::Assigned),
            (S::Pending, A::OwnerAcceptOffer) => Transition::To(S::Confirmed),
            (S::Assigned, A::OwnerConfirm) => Transition::To(S::Confirmed),
            (S::Confirmed, A::Complete) => Transition::To(S::Completed),
            (S::Confirmed | S::Completed, A::Archive) => Transition::To(S::Archived),
            (S::Pending | S::Assigned | S::Confirmed, A::Delete) => Transition::Remove,
            _ => {
                return Err(TransitionError::Illegal {
                    from: current,
                    action: self.as_str(),
                })
            }
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::ROLE_CAREGIVER;

    // -----------------------------------------------------------------------
    // Legal transitions
    // -----------------------------------------------------------------------

    #[test]
    fn pending_assign_by_admin() {
        assert_eq!(
            BookingAction::AdminAssign.apply(BookingStatus::Pending, ROLE_ADMIN),
            Ok(Transition::To(BookingStatus::Assigned))
        );
    }

    #[test]
    fn pending_accept_offer_by_owner_skips_assigned() {
        assert_eq!(
            BookingAction::OwnerAcceptOffer.apply(BookingStatus::Pending, ROLE_OWNER),
            Ok(Transition::To(BookingStatus::Confirmed))
        );
    }

    #[test]
    fn assigned_confirm_by_owner() {
        assert_eq!(
            BookingAction::OwnerConfirm.apply(BookingStatus::Assigned, ROLE_OWNER),
            Ok(Transition::To(BookingStatus::Confirmed))
        );
    }

    #[test]
    fn confirmed_complete_by_admin() {
        assert_eq!(
            BookingAction::Complete.apply(BookingStatus::Confirmed, ROLE_ADMIN),
            Ok(Transition::To(BookingStatus::Completed))
        );
    }

    #[test]
    fn confirmed_and_completed_archive() {
        for status in [BookingStatus::Confirmed, BookingStatus::Completed] {
            assert_eq!(
                BookingAction::Archive.apply(status, ROLE_ADMIN),
                Ok(Transition::To(BookingStatus::Archived))
            );
        }
    }

    #[test]
    fn delete_from_any_live_status() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Assigned,
            BookingStatus::Confirmed,
        ] {
            assert_eq!(
                BookingAction::Delete.apply(status, ROLE_ADMIN),
                Ok(Transition::Remove)
            );
        }
    }

    // -----------------------------------------------------------------------
    // Illegal transitions
    // -----------------------------------------------------------------------

    #[test]
    fn confirm_pending_is_illegal() {
        let err = BookingAction::OwnerConfirm
            .apply(BookingStatus::Pending, ROLE_OWNER)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal {
                from: BookingStatus::Pending,
                action: "confirm",
            }
        );
    }

    #[test]
    fn assign_confirmed_is_illegal() {
        assert!(BookingAction::AdminAssign
            .apply(BookingStatus::Confirmed, ROLE_ADMIN)
            .is_err());
    }

    #[test]
    fn complete_pending_is_illegal() {
        assert!(BookingAction::Complete
            .apply(BookingStatus::Pending, ROLE_ADMIN)
            .is_err());
    }

    #[test]
    fn archived_is_terminal() {
        for action in [
            BookingAction::AdminAssign,
            BookingAction::OwnerAcceptOffer,
            BookingAction::OwnerConfirm,
            BookingAction::Complete,
            BookingAction::Archive,
            BookingAction::Delete,
        ] {
            assert!(action.apply(BookingStatus::Archived, ROLE_ADMIN).is_err());
        }
    }

    #[test]
    fn delete_completed_is_illegal() {
        assert!(BookingAction::Delete
            .apply(BookingStatus::Completed, ROLE_ADMIN)
            .is_err());
    }

    // -----------------------------------------------------------------------
    // Role enforcement
    // -----------------------------------------------------------------------

    #[test]
    fn owner_cannot_assign() {
        let err = BookingAction::AdminAssign
            .apply(BookingStatus::Pending, ROLE_OWNER)
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden { .. }));
    }

    #[test]
    fn admin_cannot_accept_offer_for_owner() {
        assert!(BookingAction::OwnerAcceptOffer
            .apply(BookingStatus::Pending, ROLE_ADMIN)
            .is_err());
    }

    #[test]
    fn caregiver_cannot_transition_anything() {
        for action in [
            BookingAction::AdminAssign,
            BookingAction::OwnerAcceptOffer,
            BookingAction::OwnerConfirm,
            BookingAction::Complete,
            BookingAction::Archive,
            BookingAction::Delete,
        ] {
            assert!(matches!(
                action.apply(BookingStatus::Pending, ROLE_CAREGIVER),
                Err(TransitionError::Forbidden { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // Enum round-trips
    // -----------------------------------------------------------------------

    #[test]
    fn status_parse_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Assigned,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Archived,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("cancelled"), None);
    }

    #[test]
    fn committed_statuses() {
        assert!(BookingStatus::Assigned.is_committed());
        assert!(BookingStatus::Confirmed.is_committed());
        assert!(!BookingStatus::Pending.is_committed());
        assert!(!BookingStatus::Completed.is_committed());
    }

    #[test]
    fn window_default_starts() {
        assert_eq!(TimeWindow::Morning.default_start().to_string(), "07:00:00");
        assert_eq!(TimeWindow::Afternoon.default_start().to_string(), "12:00:00");
        assert_eq!(TimeWindow::Evening.default_start().to_string(), "18:00:00");
        assert_eq!(TimeWindow::Night.default_start().to_string(), "22:00:00");
    }
}
