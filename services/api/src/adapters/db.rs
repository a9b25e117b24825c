//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Uses the runtime query API rather than the `query!` macros so the crate
//! builds without a live DATABASE_URL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postcraft_core::domain::{
    GeneratedPost, Language, RawSample, StyleDescriptor, StyleProfile, User, UserCredentials,
};
use postcraft_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    username: String,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            username: self.username,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct RawSampleRecord {
    id: Uuid,
    user_id: Uuid,
    raw_text: String,
    created_at: DateTime<Utc>,
}
impl RawSampleRecord {
    fn to_domain(self) -> RawSample {
        RawSample {
            id: self.id,
            user_id: self.user_id,
            raw_text: self.raw_text,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct StyleProfileRecord {
    user_id: Uuid,
    tone_summary: String,
    structure_summary: String,
    vocabulary_keywords: Vec<String>,
    typical_length: i32,
    analyzed_at: DateTime<Utc>,
}
impl StyleProfileRecord {
    fn to_domain(self) -> StyleProfile {
        StyleProfile {
            user_id: self.user_id,
            tone_summary: self.tone_summary,
            structure_summary: self.structure_summary,
            vocabulary_keywords: self.vocabulary_keywords,
            typical_length: self.typical_length,
            analyzed_at: self.analyzed_at,
        }
    }
}

#[derive(FromRow)]
struct GeneratedPostRecord {
    id: Uuid,
    user_id: Uuid,
    topic: String,
    language: String,
    target_length: i32,
    generated_text: String,
    created_at: DateTime<Utc>,
}
impl GeneratedPostRecord {
    fn to_domain(self) -> GeneratedPost {
        GeneratedPost {
            id: self.id,
            user_id: self.user_id,
            topic: self.topic,
            // Rows only ever hold values written from the enum; anything else
            // degrades to the default rather than failing a read.
            language: self.language.parse().unwrap_or_default(),
            target_length: self.target_length,
            generated_text: self.generated_text,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, username, email, hashed_password) \
             VALUES ($1, $2, $3, $4) RETURNING user_id, username, email",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, username, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("No user with email {}", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => unexpected(e),
        })?;
        Ok(row.0)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_raw_samples(&self, user_id: Uuid, texts: &[String]) -> PortResult<usize> {
        // One transaction per upload; the `seq` column preserves block order
        // even though every row shares the transaction timestamp.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        for text in texts {
            sqlx::query("INSERT INTO raw_samples (id, user_id, raw_text) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(text)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(texts.len())
    }

    async fn recent_raw_samples(&self, user_id: Uuid, limit: i64) -> PortResult<Vec<RawSample>> {
        let records = sqlx::query_as::<_, RawSampleRecord>(
            "SELECT id, user_id, raw_text, created_at FROM raw_samples \
             WHERE user_id = $1 ORDER BY seq DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_raw_samples(&self, user_id: Uuid) -> PortResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM raw_samples WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(row.0)
    }

    async fn upsert_style_profile(
        &self,
        user_id: Uuid,
        descriptor: &StyleDescriptor,
    ) -> PortResult<StyleProfile> {
        // Single-row upsert: re-analysis replaces every field atomically.
        // Concurrent analyzes are not coordinated; last write wins.
        let record = sqlx::query_as::<_, StyleProfileRecord>(
            "INSERT INTO style_profiles \
               (user_id, tone_summary, structure_summary, vocabulary_keywords, typical_length, analyzed_at) \
             VALUES ($1, $2, $3, $4, $5, now()) \
             ON CONFLICT (user_id) DO UPDATE SET \
               tone_summary = EXCLUDED.tone_summary, \
               structure_summary = EXCLUDED.structure_summary, \
               vocabulary_keywords = EXCLUDED.vocabulary_keywords, \
               typical_length = EXCLUDED.typical_length, \
               analyzed_at = now() \
             RETURNING user_id, tone_summary, structure_summary, vocabulary_keywords, \
               typical_length, analyzed_at",
        )
        .bind(user_id)
        .bind(&descriptor.tone_summary)
        .bind(&descriptor.structure_summary)
        .bind(&descriptor.vocabulary_keywords)
        .bind(descriptor.typical_length)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_style_profile(&self, user_id: Uuid) -> PortResult<Option<StyleProfile>> {
        let record = sqlx::query_as::<_, StyleProfileRecord>(
            "SELECT user_id, tone_summary, structure_summary, vocabulary_keywords, \
               typical_length, analyzed_at \
             FROM style_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn create_generated_post(
        &self,
        user_id: Uuid,
        topic: &str,
        language: Language,
        target_length: i32,
        generated_text: &str,
    ) -> PortResult<GeneratedPost> {
        let record = sqlx::query_as::<_, GeneratedPostRecord>(
            "INSERT INTO generated_posts \
               (id, user_id, topic, language, target_length, generated_text) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, user_id, topic, language, target_length, generated_text, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(topic)
        .bind(language.to_string())
        .bind(target_length)
        .bind(generated_text)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_generated_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
    ) -> PortResult<GeneratedPost> {
        let record = sqlx::query_as::<_, GeneratedPostRecord>(
            "SELECT id, user_id, topic, language, target_length, generated_text, created_at \
             FROM generated_posts WHERE id = $1 AND user_id = $2",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Generated post {} not found", post_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_generated_posts(&self, user_id: Uuid) -> PortResult<Vec<GeneratedPost>> {
        let records = sqlx::query_as::<_, GeneratedPostRecord>(
            "SELECT id, user_id, topic, language, target_length, generated_text, created_at \
             FROM generated_posts WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
