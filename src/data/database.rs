//! SQLite database operations
//!
//! All database access goes through this module.
//! Every operation is a single SQL statement, so each one is atomic on
//! its own; uniqueness of `profiles.handle` and `content.guid` is
//! enforced by the schema and surfaces as `AppError::Conflict`.

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to a local SQLite file, creating it if needed, and run
    /// embedded migrations.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Get profile by handle
    pub async fn get_profile_by_handle(&self, handle: &str) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE handle = ?")
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    /// Insert a new profile
    ///
    /// # Errors
    /// `AppError::Conflict` if a profile with the same handle already exists.
    pub async fn insert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                id, handle, name, guid, visibility, rsa_public_key,
                image_url_small, image_url_medium, image_url_large,
                location, email, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.handle)
        .bind(&profile.name)
        .bind(&profile.guid)
        .bind(profile.visibility)
        .bind(&profile.rsa_public_key)
        .bind(&profile.image_url_small)
        .bind(&profile.image_url_medium)
        .bind(&profile.image_url_large)
        .bind(&profile.location)
        .bind(&profile.email)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Get content by guid
    pub async fn get_content_by_guid(&self, guid: &str) -> Result<Option<Content>, AppError> {
        let content = sqlx::query_as::<_, Content>("SELECT * FROM content WHERE guid = ?")
            .bind(guid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(content)
    }

    /// Insert a new content record as-is
    pub async fn insert_content(&self, content: &Content) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO content (
                id, guid, author_id, text, visibility, remote_created,
                service_label, is_local, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&content.id)
        .bind(&content.guid)
        .bind(&content.author_id)
        .bind(&content.text)
        .bind(content.visibility)
        .bind(content.remote_created)
        .bind(&content.service_label)
        .bind(content.is_local)
        .bind(content.created_at)
        .bind(content.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create or update remote content keyed by guid
    ///
    /// New rows are created with `is_local = false`; an existing row keeps
    /// its `is_local` flag and creation time.
    ///
    /// # Returns
    /// The stored record and `true` if it was created by this call.
    pub async fn upsert_content(
        &self,
        guid: &str,
        values: &ContentValues,
    ) -> Result<(Content, bool), AppError> {
        let new_id = EntityId::new().0;
        let now = Utc::now();

        let content = sqlx::query_as::<_, Content>(
            r#"
            INSERT INTO content (
                id, guid, author_id, text, visibility, remote_created,
                service_label, is_local, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            ON CONFLICT(guid) DO UPDATE SET
                author_id = excluded.author_id,
                text = excluded.text,
                visibility = excluded.visibility,
                remote_created = excluded.remote_created,
                service_label = excluded.service_label,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(&new_id)
        .bind(guid)
        .bind(&values.author_id)
        .bind(&values.text)
        .bind(values.visibility)
        .bind(values.remote_created)
        .bind(&values.service_label)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let created = content.id == new_id;
        Ok((content, created))
    }

    /// Delete content by ID
    pub async fn delete_content(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM content WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Number of stored content records
    pub async fn count_content(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
