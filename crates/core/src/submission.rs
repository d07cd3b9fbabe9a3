//! Booking submission validation.
//!
//! [`BookingSubmission`] is the raw, untrusted form payload. Shape checks
//! (lengths, email, strict patterns) are declared with `validator` derive
//! attributes; enum membership and calendar parsing happen in
//! [`BookingSubmission::normalize`], which produces either a
//! [`NormalizedBooking`] or a field→message map so the client can render
//! errors next to the offending inputs.
//!
//! The `website` field is a hidden honeypot: humans never see it, form bots
//! fill it. A tripped honeypot is handled by the API with a generic success
//! response so bots cannot learn which submissions were dropped.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::Deserialize;
use validator::Validate;

use crate::booking::{ContactPreference, ServiceType, TimeWindow};
use crate::error::FieldErrors;
use crate::slot;
use crate::types::Timestamp;

/// Strict `HH:MM` 24-hour time pattern.
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

/// 4-digit postal code.
static POSTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("valid postal regex"));

// ---------------------------------------------------------------------------
// Raw submission
// ---------------------------------------------------------------------------

/// Raw booking form payload.
///
/// Every field defaults on deserialization so a missing field surfaces as a
/// field validation error instead of a request-level deserialize failure.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BookingSubmission {
    #[serde(default)]
    pub service: String,

    #[serde(default)]
    pub time_window: String,

    #[serde(default)]
    pub date: String,

    /// Optional explicit start time, `HH:MM`, overrides the window default.
    #[serde(default)]
    #[validate(regex(path = *TIME_RE, message = "must be a valid HH:MM time"))]
    pub start_time: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub last_name: String,

    #[serde(default)]
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub phone: String,

    /// Street address is optional; city and postal code are not.
    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub city: String,

    #[serde(default)]
    #[validate(regex(path = *POSTAL_RE, message = "must be a 4-digit postal code"))]
    pub postal_code: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub pet_name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub pet_type: String,

    #[serde(default)]
    pub contact_preference: String,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub is_recurring: bool,

    /// Honeypot. Hidden in the UI; any value means a bot filled the form.
    #[serde(default)]
    pub website: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalized record
// ---------------------------------------------------------------------------

/// A fully validated and normalized booking submission.
#[derive(Debug, Clone)]
pub struct NormalizedBooking {
    pub service: ServiceType,
    pub time_window: TimeWindow,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    /// Canonical UTC slot instant derived from date/window/explicit time.
    pub slot_starts_at: Timestamp,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub pet_name: String,
    pub pet_type: String,
    pub contact_preference: ContactPreference,
    pub message: Option<String>,
    pub is_recurring: bool,
}

impl BookingSubmission {
    /// True when the hidden honeypot field was populated.
    pub fn is_spam(&self) -> bool {
        self.website.as_deref().is_some_and(|w| !w.trim().is_empty())
    }

    /// Validate field-by-field and normalize into a typed record.
    ///
    /// All failures are collected; the caller gets the complete field→error
    /// map in one pass rather than the first failure only.
    pub fn normalize(&self) -> Result<NormalizedBooking, FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Err(shape_errors) = self.validate() {
            for (field, field_errors) in shape_errors.field_errors() {
                if let Some(first) = field_errors.first() {
                    let message = first
                        .message
                        .as_deref()
                        .unwrap_or("is invalid")
                        .to_string();
                    errors.push(field.to_string(), message);
                }
            }
        }

        let service = ServiceType::parse(&self.service);
        if service.is_none() {
            errors.push("service", "unknown service type");
        }

        let time_window = TimeWindow::parse(&self.time_window);
        if time_window.is_none() {
            errors.push("time_window", "unknown time window");
        }

        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok();
        if date.is_none() {
            errors.push("date", "must be a valid calendar date (YYYY-MM-DD)");
        }

        // The strict pattern has already been enforced by the derive; parse
        // only when it matched so a bad value yields one error, not two.
        let start_time = match &self.start_time {
            Some(raw) if TIME_RE.is_match(raw) => {
                NaiveTime::parse_from_str(raw, "%H:%M").ok()
            }
            _ => None,
        };

        let contact_preference = ContactPreference::parse(&self.contact_preference);
        if contact_preference.is_none() {
            errors.push("contact_preference", "must be one of: email, phone, sms");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        // All options are Some past this point; the map above is complete.
        let (service, time_window, date, contact_preference) = (
            service.expect("validated"),
            time_window.expect("validated"),
            date.expect("validated"),
            contact_preference.expect("validated"),
        );

        Ok(NormalizedBooking {
            slot_starts_at: slot::slot_start(date, time_window, start_time),
            service,
            time_window,
            date,
            start_time,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.clone(),
            pet_name: self.pet_name.trim().to_string(),
            pet_type: self.pet_type.trim().to_string(),
            contact_preference,
            message: self
                .message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from),
            is_recurring: self.is_recurring,
        })
    }
}
