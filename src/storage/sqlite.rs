//! SQLite credential store and application registry.
//!
//! One handle implements all four capability traits; the pool is cheap to
//! clone, so the same storage is injected into each seam of the auth core.
//! Email uniqueness is enforced by the schema, which is what serializes
//! concurrent duplicate registrations.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::auth::{AppProvider, RoleProvider, UserProvider, UserSaver};
use crate::error::StorageError;
use crate::models::{App, User};

/// SQLite-backed storage handle.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Opens the database at `path` (creating it if missing) and applies any
    /// pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::Database(e.into()))?;

        Ok(Self { pool })
    }

    /// The underlying connection pool, for administrative tooling and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts or replaces a client application row.
    ///
    /// Application lifecycle is owned by administrative tooling, not the auth
    /// service; only the migrate binary and tests call this.
    pub async fn save_app(&self, id: i64, name: &str, secret: &str) -> Result<(), StorageError> {
        sqlx::query("INSERT OR REPLACE INTO apps (id, name, secret) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(name)
            .bind(secret)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl UserSaver for SqliteStorage {
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, StorageError> {
        let result = sqlx::query("INSERT INTO users (email, pass_hash) VALUES (?1, ?2)")
            .bind(email)
            .bind(pass_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    StorageError::AlreadyExists
                } else {
                    StorageError::Database(e)
                }
            })?;

        Ok(result.last_insert_rowid())
    }
}

#[async_trait]
impl UserProvider for SqliteStorage {
    async fn user_by_email(&self, email: &str) -> Result<User, StorageError> {
        let row = sqlx::query("SELECT id, email, pass_hash FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(User {
            id: row.get(0),
            email: row.get(1),
            pass_hash: row.get(2),
        })
    }
}

#[async_trait]
impl AppProvider for SqliteStorage {
    async fn app(&self, app_id: i64) -> Result<App, StorageError> {
        let row = sqlx::query("SELECT id, name, secret FROM apps WHERE id = ?1")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(App {
            id: row.get(0),
            name: row.get(1),
            secret: row.get(2),
        })
    }
}

#[async_trait]
impl RoleProvider for SqliteStorage {
    async fn is_admin(&self, user_id: i64) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT is_admin FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(row.get(0))
    }
}
