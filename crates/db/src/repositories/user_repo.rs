//! Repository for the `users` table.

use sqlx::PgPool;

use pawhub_core::types::DbId;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "id, email, full_name, role, created_at";

/// Provides data access for engine-visible user records.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user (seeding, tests, and the provisioning hook).
    pub async fn create(
        pool: &PgPool,
        email: &str,
        full_name: &str,
        role: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, full_name, role) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(full_name)
            .bind(role)
            .fetch_one(pool)
            .await
    }

    /// Fetch a user by id.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all platform admins (broadcast recipients).
    pub async fn list_admins(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE role = 'admin' ORDER BY id");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }
}
