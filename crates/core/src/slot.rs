//! Slot calculation: canonical slot instants, past checks, and the booking
//! horizon.
//!
//! A booking slot is (calendar date, time window, optional explicit time).
//! The canonical instant is anchored in the platform reference timezone and
//! stored as UTC. The same two checks are applied everywhere a slot is
//! touched: at creation, at admin assignment, and at owner confirmation,
//! because time elapses between creation and assignment.

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::booking::TimeWindow;
use crate::types::Timestamp;

/// The platform reference timezone. All customer-facing dates and times are
/// interpreted in this zone.
pub const REFERENCE_TZ: Tz = chrono_tz::Europe::Oslo;

/// Maximum number of days in the future a booking may be scheduled.
pub const BOOKING_HORIZON_DAYS: i64 = 60;

/// Bookings whose slot date is older than this fall out of the "active"
/// read partition.
pub const ARCHIVE_WINDOW_DAYS: i64 = 90;

/// Compute the canonical UTC instant for a booking slot.
///
/// An explicit time, when supplied, overrides the window's default start.
/// On a DST spring-forward gap the local time does not exist; the slot is
/// shifted forward one hour.
pub fn slot_start(date: NaiveDate, window: TimeWindow, explicit: Option<NaiveTime>) -> Timestamp {
    let time = explicit.unwrap_or_else(|| window.default_start());
    let naive = date.and_time(time);
    let local = REFERENCE_TZ
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| {
            REFERENCE_TZ
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
                .unwrap_or_else(|| REFERENCE_TZ.from_utc_datetime(&naive))
        });
    local.with_timezone(&Utc)
}

/// A slot instant exactly equal to "now" is already in the past.
pub fn is_past(slot: Timestamp, now: Timestamp) -> bool {
    slot <= now
}

/// The slot date must not exceed `today + BOOKING_HORIZON_DAYS`.
pub fn within_horizon(date: NaiveDate, today: NaiveDate) -> bool {
    date <= today + Duration::days(BOOKING_HORIZON_DAYS)
}

/// Today's calendar date in the reference timezone.
pub fn today() -> NaiveDate {
    Utc::now().with_timezone(&REFERENCE_TZ).date_naive()
}

/// Slot dates strictly before this cutoff belong to the "history" partition.
pub fn history_cutoff(today: NaiveDate) -> NaiveDate {
    today - Duration::days(ARCHIVE_WINDOW_DAYS)
}
