//! CRUD operations for [`User`] records.

use rusqlite::params;
use uuid::Uuid;

use ecowear_shared::Role;

use crate::database::{role_col, time_col, uuid_col, Database};
use crate::error::{Result, StoreError};
use crate::models::User;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user. The email must be unused; callers check first.
    pub fn create_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, name, email, password_hash, role, is_verified, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.password_hash,
                user.role.as_str(),
                user.is_verified,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single user by id.
    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, name, email, password_hash, role, is_verified, created_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Fetch a single user by email. Emails are unique.
    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, name, email, password_hash, role, is_verified, created_at
                 FROM users WHERE email = ?1",
                params![email],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// List all seller accounts in registration order.
    pub fn list_sellers(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, email, password_hash, role, is_verified, created_at
             FROM users WHERE role = ?1 ORDER BY rowid ASC",
        )?;

        let rows = stmt.query_map(params![Role::Seller.as_str()], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Set the verification flag. Returns `false` if no such user exists.
    /// This is the only mutation users support.
    pub fn set_verified(&self, id: Uuid, verified: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET is_verified = ?1 WHERE id = ?2",
            params![verified, id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(4)?;
    let created_str: String = row.get(6)?;

    Ok(User {
        id: uuid_col(0, &id_str)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: role_col(4, &role_str)?,
        is_verified: row.get(5)?,
        created_at: time_col(6, &created_str)?,
    })
}
