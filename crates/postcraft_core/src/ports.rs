//! crates/postcraft_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    GeneratedPost, GeneratedText, Language, RawSample, StyleAnalysis, StyleDescriptor,
    StyleProfile, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Raw Samples ---
    /// Persists one batch of sample texts for a user, in the given order.
    async fn create_raw_samples(&self, user_id: Uuid, texts: &[String]) -> PortResult<usize>;

    /// Returns up to `limit` of the user's samples, most recent first.
    async fn recent_raw_samples(&self, user_id: Uuid, limit: i64) -> PortResult<Vec<RawSample>>;

    async fn count_raw_samples(&self, user_id: Uuid) -> PortResult<i64>;

    // --- Style Profile ---
    /// Overwrites every descriptor field of the user's profile in one write,
    /// creating the row if the user has never analyzed before.
    async fn upsert_style_profile(
        &self,
        user_id: Uuid,
        descriptor: &StyleDescriptor,
    ) -> PortResult<StyleProfile>;

    async fn get_style_profile(&self, user_id: Uuid) -> PortResult<Option<StyleProfile>>;

    // --- Generated Posts ---
    async fn create_generated_post(
        &self,
        user_id: Uuid,
        topic: &str,
        language: Language,
        target_length: i32,
        generated_text: &str,
    ) -> PortResult<GeneratedPost>;

    async fn get_generated_post(&self, user_id: Uuid, post_id: Uuid)
        -> PortResult<GeneratedPost>;

    async fn list_generated_posts(&self, user_id: Uuid) -> PortResult<Vec<GeneratedPost>>;
}

#[async_trait]
pub trait StyleAnalysisService: Send + Sync {
    /// Derives a style descriptor from one batch of joined sample text.
    ///
    /// Infallible by contract: a failed call or unparseable response yields
    /// the fallback descriptor, with the cause recorded in the outcome.
    async fn analyze_style(&self, samples_text: &str) -> StyleAnalysis;
}

#[async_trait]
pub trait PostGenerationService: Send + Sync {
    /// Generates post text on `topic` in the style described by `descriptor`.
    ///
    /// Infallible by contract: a failed call yields a fixed templated string
    /// interpolating the topic and tone summary.
    async fn generate_post(
        &self,
        topic: &str,
        descriptor: &StyleDescriptor,
        language: Language,
        target_length: i32,
    ) -> GeneratedText;
}
