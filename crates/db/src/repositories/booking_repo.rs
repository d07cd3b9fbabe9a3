//! Repository for the `bookings` table.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use pawhub_core::booking::BookingStatus;
use pawhub_core::types::DbId;

use crate::models::booking::{Booking, BookingView, NewBooking};

/// Column list for `bookings` queries.
const COLUMNS: &str = "id, owner_id, caregiver_id, service, service_date, time_window, \
     start_time, slot_starts_at, contact_first_name, contact_last_name, contact_email, \
     contact_phone, address, city, postal_code, pet_name, pet_type, contact_preference, \
     message, status, admin_notes, is_recurring, created_at";

/// SQL predicate for a [`BookingView`], with the cutoff date bound at the
/// given parameter position.
///
/// "Active" and "history" are a read-time classification over a rolling
/// window; a booking crosses from one to the other by aging alone, without
/// its stored status being touched.
fn view_predicate(view: BookingView, cutoff_param: &str) -> String {
    match view {
        BookingView::Active => {
            format!("(status <> 'archived' AND service_date >= {cutoff_param})")
        }
        BookingView::History => {
            format!("(status = 'archived' OR service_date < {cutoff_param})")
        }
    }
}

/// Provides data access for the booking aggregate.
pub struct BookingRepo;

impl BookingRepo {
    /// Insert a booking row, returning the stored aggregate.
    pub async fn create(conn: &mut PgConnection, new: &NewBooking) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings (owner_id, caregiver_id, service, service_date, \
                time_window, start_time, slot_starts_at, contact_first_name, \
                contact_last_name, contact_email, contact_phone, address, city, \
                postal_code, pet_name, pet_type, contact_preference, message, status, \
                is_recurring) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                $16, $17, $18, $19, $20) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(new.owner_id)
            .bind(new.caregiver_id)
            .bind(&new.service)
            .bind(new.service_date)
            .bind(&new.time_window)
            .bind(new.start_time)
            .bind(new.slot_starts_at)
            .bind(&new.contact_first_name)
            .bind(&new.contact_last_name)
            .bind(&new.contact_email)
            .bind(&new.contact_phone)
            .bind(&new.address)
            .bind(&new.city)
            .bind(&new.postal_code)
            .bind(&new.pet_name)
            .bind(&new.pet_type)
            .bind(&new.contact_preference)
            .bind(&new.message)
            .bind(new.status.as_str())
            .bind(new.is_recurring)
            .fetch_one(conn)
            .await
    }

    /// Fetch a booking by id.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a booking by id with a row lock, serializing concurrent
    /// transitions against the same booking.
    pub async fn get_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List one owner's bookings in the given view partition.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        view: BookingView,
        cutoff: NaiveDate,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let predicate = view_predicate(view, "$2");
        let query = format!(
            "SELECT {COLUMNS} FROM bookings \
             WHERE owner_id = $1 AND {predicate} \
             ORDER BY service_date, slot_starts_at"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(owner_id)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Paginated admin list over a view partition.
    pub async fn list(
        pool: &PgPool,
        view: BookingView,
        cutoff: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let predicate = view_predicate(view, "$1");
        let query = format!(
            "SELECT {COLUMNS} FROM bookings \
             WHERE {predicate} \
             ORDER BY service_date, slot_starts_at \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(cutoff)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Commit a caregiver to a booking with the given status.
    pub async fn set_assignment(
        conn: &mut PgConnection,
        id: DbId,
        caregiver_id: DbId,
        status: BookingStatus,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET caregiver_id = $2, status = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(caregiver_id)
            .bind(status.as_str())
            .fetch_one(conn)
            .await
    }

    /// Update only the status.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: BookingStatus,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(conn)
            .await
    }

    /// Update the admin annotation.
    pub async fn set_admin_notes(
        pool: &PgPool,
        id: DbId,
        notes: Option<&str>,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET admin_notes = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(notes)
            .fetch_one(pool)
            .await
    }

    /// Remove a booking row. Returns `true` if a row was deleted.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Does the caregiver already hold a committed (assigned or confirmed)
    /// booking on this date and window?
    ///
    /// Runs inside the committing transaction; `uq_bookings_caregiver_slot`
    /// is the storage-layer backstop should two transactions pass this check
    /// concurrently.
    pub async fn has_slot_conflict(
        conn: &mut PgConnection,
        caregiver_id: DbId,
        service_date: NaiveDate,
        time_window: &str,
        exclude_booking_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings \
             WHERE caregiver_id = $1 AND service_date = $2 AND time_window = $3 \
               AND status IN ('assigned', 'confirmed') \
               AND ($4::BIGINT IS NULL OR id <> $4)",
        )
        .bind(caregiver_id)
        .bind(service_date)
        .bind(time_window)
        .bind(exclude_booking_id)
        .fetch_one(conn)
        .await?;
        Ok(count > 0)
    }
}
