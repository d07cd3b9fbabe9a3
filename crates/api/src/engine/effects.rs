//! Outbound task payloads per booking transition.
//!
//! Each function returns the full set of notification/email tasks a
//! transition fans out. The engine enqueues them in the committing
//! transaction; the outbox dispatcher delivers them afterwards. Payload
//! shapes match `pawhub_events::outbox::{NotificationPayload, EmailPayload}`.

use serde_json::json;

use pawhub_db::models::booking::Booking;
use pawhub_db::models::notification::{KIND_ASSIGNMENT, KIND_CANCELLED, KIND_CONFIRMATION};
use pawhub_db::models::outbox::{TASK_EMAIL, TASK_NOTIFICATION};
use pawhub_db::models::user::User;

/// One outbound task ready to enqueue.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub kind: &'static str,
    pub payload: serde_json::Value,
}

fn notify(user: &User, kind: &str, title: &str, message: String, booking: &Booking) -> TaskSpec {
    TaskSpec {
        kind: TASK_NOTIFICATION,
        payload: json!({
            "user_id": user.id,
            "kind": kind,
            "title": title,
            "message": message,
            "booking_id": booking.id,
        }),
    }
}

fn email(to: &str, subject: String, body: String, reply_to: Option<&str>) -> TaskSpec {
    let mut payload = json!({
        "to": to,
        "subject": subject,
        "body": body,
    });
    if let Some(reply_to) = reply_to {
        payload["reply_to"] = json!(reply_to);
    }
    TaskSpec {
        kind: TASK_EMAIL,
        payload,
    }
}

/// Human-readable slot description, e.g. `2026-09-01 morning (09:30)`.
fn slot_label(booking: &Booking) -> String {
    match booking.start_time {
        Some(time) => format!(
            "{} {} ({})",
            booking.service_date,
            booking.time_window,
            time.format("%H:%M")
        ),
        None => format!("{} {}", booking.service_date, booking.time_window),
    }
}

/// A new pending booking arrived: let every admin know there is dispatch
/// work waiting.
pub fn booking_received(booking: &Booking, admins: &[User]) -> Vec<TaskSpec> {
    admins
        .iter()
        .map(|admin| {
            notify(
                admin,
                KIND_ASSIGNMENT,
                "New booking request",
                format!(
                    "{} {} requested {} on {}",
                    booking.contact_first_name,
                    booking.contact_last_name,
                    booking.service,
                    slot_label(booking)
                ),
                booking,
            )
        })
        .collect()
}

/// Admin committed a caregiver: the caregiver gets the assignment, the owner
/// gets an acknowledgement.
pub fn assignment(booking: &Booking, owner: &User, caregiver: &User) -> Vec<TaskSpec> {
    let slot = slot_label(booking);
    vec![
        notify(
            caregiver,
            KIND_ASSIGNMENT,
            "New assignment",
            format!(
                "You have been assigned {} for {} on {}",
                booking.service, booking.pet_name, slot
            ),
            booking,
        ),
        notify(
            owner,
            KIND_ASSIGNMENT,
            "Caregiver assigned",
            format!(
                "{} has been assigned to your {} booking on {}. Please confirm.",
                caregiver.full_name, booking.service, slot
            ),
            booking,
        ),
        email(
            &caregiver.email,
            format!("New assignment: {} on {}", booking.service, slot),
            format!(
                "Hi {},\n\nYou have been assigned a {} booking for {} ({}) on {}.\n\
                 Address: {}, {} {}\n\nReply to this email to reach the owner.",
                caregiver.full_name,
                booking.service,
                booking.pet_name,
                booking.pet_type,
                slot,
                booking.address.as_deref().unwrap_or("(no street address)"),
                booking.postal_code,
                booking.city,
            ),
            Some(&booking.contact_email),
        ),
        email(
            &booking.contact_email,
            format!("A caregiver was assigned to your booking on {slot}"),
            format!(
                "Hi {},\n\n{} will take care of {} on {}.\n\
                 Please confirm the assignment in the app.",
                booking.contact_first_name, caregiver.full_name, booking.pet_name, slot,
            ),
            None,
        ),
    ]
}

/// Owner accepted an offer directly: same fan-out as an assignment plus an
/// in-app broadcast to every admin and an email to the admin who proposed
/// the winning candidate, because the confirmation bypassed admin mediation.
pub fn acceptance(
    booking: &Booking,
    owner: &User,
    caregiver: &User,
    admins: &[User],
    offering_admin: Option<&User>,
) -> Vec<TaskSpec> {
    let slot = slot_label(booking);
    let mut tasks = vec![
        notify(
            caregiver,
            KIND_ASSIGNMENT,
            "Offer accepted",
            format!(
                "Your offer for {} on {} was accepted. The booking is confirmed.",
                booking.pet_name, slot
            ),
            booking,
        ),
        notify(
            owner,
            KIND_CONFIRMATION,
            "Booking confirmed",
            format!(
                "You accepted {}'s offer. Your {} booking on {} is confirmed.",
                caregiver.full_name, booking.service, slot
            ),
            booking,
        ),
        email(
            &caregiver.email,
            format!("Offer accepted: {} on {}", booking.service, slot),
            format!(
                "Hi {},\n\nYour offer was accepted. You are confirmed for {} ({}) on {}.\n\
                 Address: {}, {} {}",
                caregiver.full_name,
                booking.pet_name,
                booking.pet_type,
                slot,
                booking.address.as_deref().unwrap_or("(no street address)"),
                booking.postal_code,
                booking.city,
            ),
            Some(&booking.contact_email),
        ),
        email(
            &booking.contact_email,
            format!("Your booking on {slot} is confirmed"),
            format!(
                "Hi {},\n\n{} is confirmed for {} on {}.",
                booking.contact_first_name, caregiver.full_name, booking.pet_name, slot,
            ),
            None,
        ),
    ];
    for admin in admins {
        tasks.push(notify(
            admin,
            KIND_CONFIRMATION,
            "Offer accepted by owner",
            format!(
                "Booking #{} was confirmed directly: the owner accepted {}'s offer for {}.",
                booking.id, caregiver.full_name, slot
            ),
            booking,
        ));
    }
    if let Some(admin) = offering_admin {
        tasks.push(email(
            &admin.email,
            format!("Booking #{} confirmed by owner", booking.id),
            format!(
                "The owner accepted {}'s offer for {} on {}. No further dispatch needed.",
                caregiver.full_name, booking.service, slot
            ),
            None,
        ));
    }
    tasks
}

/// Owner confirmed an admin-made assignment.
pub fn confirmation(booking: &Booking, owner: &User, caregiver: &User) -> Vec<TaskSpec> {
    let slot = slot_label(booking);
    vec![
        notify(
            caregiver,
            KIND_CONFIRMATION,
            "Booking confirmed",
            format!(
                "The owner confirmed your assignment for {} on {}.",
                booking.pet_name, slot
            ),
            booking,
        ),
        notify(
            owner,
            KIND_CONFIRMATION,
            "Booking confirmed",
            format!("Your {} booking on {} is confirmed.", booking.service, slot),
            booking,
        ),
        email(
            &caregiver.email,
            format!("Confirmed: {} on {}", booking.service, slot),
            format!(
                "Hi {},\n\nThe owner confirmed. You are booked for {} on {}.",
                caregiver.full_name, booking.pet_name, slot,
            ),
            Some(&booking.contact_email),
        ),
        email(
            &booking.contact_email,
            format!("Your booking on {slot} is confirmed"),
            format!(
                "Hi {},\n\nYour {} booking on {} is confirmed with {}.",
                booking.contact_first_name, booking.service, slot, caregiver.full_name,
            ),
            None,
        ),
    ]
}

/// Admin deleted the booking: cancellation notices to the owner and, when a
/// caregiver was committed, to the caregiver.
pub fn cancellation(booking: &Booking, owner: &User, caregiver: Option<&User>) -> Vec<TaskSpec> {
    let slot = slot_label(booking);
    let mut tasks = vec![
        notify(
            owner,
            KIND_CANCELLED,
            "Booking cancelled",
            format!("Your {} booking on {} was cancelled.", booking.service, slot),
            booking,
        ),
        email(
            &booking.contact_email,
            format!("Your booking on {slot} was cancelled"),
            format!(
                "Hi {},\n\nYour {} booking for {} on {} has been cancelled.\n\
                 Contact us if you believe this is a mistake.",
                booking.contact_first_name, booking.service, booking.pet_name, slot,
            ),
            None,
        ),
    ];
    if let Some(caregiver) = caregiver {
        tasks.push(notify(
            caregiver,
            KIND_CANCELLED,
            "Assignment cancelled",
            format!("Your assignment for {} on {} was cancelled.", booking.pet_name, slot),
            booking,
        ));
        tasks.push(email(
            &caregiver.email,
            format!("Assignment cancelled: {slot}"),
            format!(
                "Hi {},\n\nYour assignment for {} on {} has been cancelled.",
                caregiver.full_name, booking.pet_name, slot,
            ),
            None,
        ));
    }
    tasks
}
