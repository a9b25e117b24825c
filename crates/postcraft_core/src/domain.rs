//! crates/postcraft_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! except where a type is part of the wire contract (Language, StyleDescriptor).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// One raw sample post uploaded by a user. Immutable once created;
/// removed only when the owning account is deleted.
#[derive(Debug, Clone)]
pub struct RawSample {
    pub id: Uuid,
    pub user_id: Uuid,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

/// The stored style profile row. At most one per user; every analysis
/// overwrites all descriptor fields in a single write.
#[derive(Debug, Clone)]
pub struct StyleProfile {
    pub user_id: Uuid,
    pub tone_summary: String,
    pub structure_summary: String,
    pub vocabulary_keywords: Vec<String>,
    pub typical_length: i32,
    pub analyzed_at: DateTime<Utc>,
}

impl StyleProfile {
    pub fn descriptor(&self) -> StyleDescriptor {
        StyleDescriptor {
            tone_summary: self.tone_summary.clone(),
            structure_summary: self.structure_summary.clone(),
            vocabulary_keywords: self.vocabulary_keywords.clone(),
            typical_length: self.typical_length,
        }
    }
}

/// A post produced by a generation request. Append-only; every request
/// creates a new row even for identical inputs.
#[derive(Debug, Clone)]
pub struct GeneratedPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub language: Language,
    pub target_length: i32,
    pub generated_text: String,
    pub created_at: DateTime<Utc>,
}

/// The four-field style contract exchanged with the model service.
/// This is the value the extraction prompt asks for and the generation
/// prompt consumes; the field names are part of the model-facing JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    pub tone_summary: String,
    pub structure_summary: String,
    pub vocabulary_keywords: Vec<String>,
    pub typical_length: i32,
}

/// Fixed descriptor substituted when the model call fails or its output
/// cannot be parsed. The workflow must always produce some profile.
pub const FALLBACK_TONE: &str = "Direct and professional";
pub const FALLBACK_STRUCTURE: &str = "Short paragraphs with calls to action";
pub const FALLBACK_KEYWORDS: [&str; 4] = ["excited", "team", "learned", "share"];
pub const FALLBACK_TYPICAL_LENGTH: i32 = 250;

/// Default word count used when neither the request nor the stored profile
/// carries a usable target length.
pub const DEFAULT_TARGET_LENGTH: i32 = 250;

impl StyleDescriptor {
    /// The fixed fallback descriptor. Deliberate availability-over-accuracy
    /// tradeoff: callers always get a fully-populated descriptor.
    pub fn fallback() -> Self {
        Self {
            tone_summary: FALLBACK_TONE.to_string(),
            structure_summary: FALLBACK_STRUCTURE.to_string(),
            vocabulary_keywords: FALLBACK_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            typical_length: FALLBACK_TYPICAL_LENGTH,
        }
    }
}

/// Where an analysis result came from. Caller-visible behavior is identical
/// for all three, but tests (and logs) can tell the fallback causes apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorSource {
    /// The model responded and its output parsed as a descriptor.
    Model,
    /// The model responded but the output was not a valid descriptor.
    ParseFallback,
    /// The model call itself failed.
    CallFallback,
}

/// The outcome of one style-extraction round trip. Never an error.
#[derive(Debug, Clone)]
pub struct StyleAnalysis {
    pub descriptor: StyleDescriptor,
    pub source: DescriptorSource,
}

/// Where a generated text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    Model,
    CallFallback,
}

/// The outcome of one post-generation round trip. Never an error.
#[derive(Debug, Clone)]
pub struct GeneratedText {
    pub text: String,
    pub source: GenerationSource,
}

/// The closed set of output languages a generation request may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    Hindi,
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::Hindi => write!(f, "Hindi"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "English" => Ok(Language::English),
            "Hindi" => Ok(Language::Hindi),
            other => Err(format!("'{}' is not a supported language", other)),
        }
    }
}
