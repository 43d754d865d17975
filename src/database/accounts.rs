//! Admin Account Operations
//!
//! Console login checks against the `admins` table: a single lookup by
//! username, restricted to active accounts, with a last-login timestamp
//! update on success.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Database;

/// Admin account record (the password column is never read back).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminRecord {
    pub id: String,
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub active: bool,
}

impl AdminRecord {
    /// Display name for the account, falling back to the username.
    pub fn full_name(&self) -> String {
        match (&self.firstname, &self.lastname) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

/// Extension trait for admin account database operations
pub trait AccountOps {
    /// Check a username/password pair against active accounts. Returns the
    /// matching record (and bumps its last-login timestamp) or `None`.
    fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Option<AdminRecord>, sqlx::Error>> + Send;

    /// Insert an account. Used by provisioning and test fixtures.
    fn insert_admin(
        &self,
        record: &AdminRecord,
        password: &str,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
}

impl AccountOps for Database {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AdminRecord>, sqlx::Error> {
        // Passwords are compared as stored. TODO: hash stored passwords
        // (argon2) and migrate existing rows before any non-demo deployment.
        let record = sqlx::query_as::<_, AdminRecord>(
            r#"
            SELECT id, username, firstname, lastname, active
            FROM admins
            WHERE username = ? AND password = ? AND active = 1
            "#,
        )
        .bind(username)
        .bind(password)
        .fetch_optional(self.pool())
        .await?;

        if let Some(record) = &record {
            sqlx::query("UPDATE admins SET last_login = ? WHERE id = ?")
                .bind(chrono::Utc::now().to_rfc3339())
                .bind(&record.id)
                .execute(self.pool())
                .await?;
        }

        Ok(record)
    }

    async fn insert_admin(&self, record: &AdminRecord, password: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO admins (id, username, password, firstname, lastname, active)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.username)
        .bind(password)
        .bind(&record.firstname)
        .bind(&record.lastname)
        .bind(record.active)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
