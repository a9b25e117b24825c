//! crates/postcraft_core/src/workflow.rs
//!
//! The workflow controller: orchestrates upload -> analysis -> generation over
//! the service ports, enforcing ownership ordering and input limits. This is
//! the only real business logic in the system; everything around it is CRUD.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    DescriptorSource, GeneratedPost, Language, StyleProfile, DEFAULT_TARGET_LENGTH,
};
use crate::ports::{DatabaseService, PortError, PostGenerationService, StyleAnalysisService};

/// Separator users place between pasted posts.
pub const SAMPLE_SEPARATOR: &str = "---";

/// Separator used when joining stored samples back together for analysis.
/// Padded with blank lines so the model sees distinct blocks.
pub const SAMPLE_JOIN: &str = "\n\n---\n\n";

/// At most this many blocks from one upload are persisted; the rest are
/// silently dropped, matching the upload form's documented 5-15 range.
pub const MAX_UPLOAD_BLOCKS: usize = 15;

/// Analysis reads at most this many of the user's most recent samples.
pub const ANALYZE_SAMPLE_LIMIT: i64 = 10;

/// Joined sample text is cut to this many characters before it is embedded
/// in the extraction prompt, to bound prompt cost.
pub const ANALYSIS_CHAR_BUDGET: usize = 4000;

/// Upper bound on the topic string of a generation request.
pub const MAX_TOPIC_LENGTH: usize = 200;

//=========================================================================================
// Workflow Errors
//=========================================================================================

/// User-facing rejections raised before any model call, plus pass-through
/// infrastructure errors. Model failures never surface here; the adapters
/// mask them with fallback values.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Paste at least one post to upload")]
    EmptyUpload,
    #[error("Upload posts first!")]
    NoSamples,
    #[error("Analyze style first!")]
    NoProfile,
    #[error("Topic must not be empty")]
    EmptyTopic,
    #[error("Topic must be 200 characters or fewer")]
    TopicTooLong,
    #[error(transparent)]
    Port(#[from] PortError),
}

//=========================================================================================
// Pure Helpers
//=========================================================================================

/// Splits `text` strictly on every occurrence of `separator`, trims each
/// block, and drops empty blocks. Order is preserved.
pub fn split_blocks(text: &str, separator: &str) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

/// Cuts `text` to at most `max_chars` characters, on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//=========================================================================================
// The Workflow Controller
//=========================================================================================

/// Orchestrates the upload/analyze/generate state machine for one account at
/// a time. Holds the three ports; carries no state of its own.
#[derive(Clone)]
pub struct Workflow {
    db: Arc<dyn DatabaseService>,
    style: Arc<dyn StyleAnalysisService>,
    generation: Arc<dyn PostGenerationService>,
}

impl Workflow {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        style: Arc<dyn StyleAnalysisService>,
        generation: Arc<dyn PostGenerationService>,
    ) -> Self {
        Self {
            db,
            style,
            generation,
        }
    }

    /// Splits a pasted text block into samples and persists at most
    /// [`MAX_UPLOAD_BLOCKS`] of them, in original order. Returns the number
    /// actually persisted. Excess blocks are dropped without error.
    pub async fn upload_samples(
        &self,
        user_id: Uuid,
        posts_text: &str,
    ) -> Result<usize, WorkflowError> {
        let mut blocks = split_blocks(posts_text, SAMPLE_SEPARATOR);
        if blocks.is_empty() {
            return Err(WorkflowError::EmptyUpload);
        }
        blocks.truncate(MAX_UPLOAD_BLOCKS);
        let persisted = self.db.create_raw_samples(user_id, &blocks).await?;
        Ok(persisted)
    }

    /// Runs style extraction over the user's most recent samples and stores
    /// the result, overwriting any prior profile in full.
    ///
    /// Rejected before any model call when the user has no samples.
    pub async fn analyze(
        &self,
        user_id: Uuid,
    ) -> Result<(StyleProfile, DescriptorSource), WorkflowError> {
        let samples = self
            .db
            .recent_raw_samples(user_id, ANALYZE_SAMPLE_LIMIT)
            .await?;
        if samples.is_empty() {
            return Err(WorkflowError::NoSamples);
        }

        let joined = samples
            .iter()
            .map(|s| s.raw_text.as_str())
            .collect::<Vec<_>>()
            .join(SAMPLE_JOIN);

        let analysis = self.style.analyze_style(&joined).await;
        let profile = self
            .db
            .upsert_style_profile(user_id, &analysis.descriptor)
            .await?;
        Ok((profile, analysis.source))
    }

    /// Generates a post on `topic` in the user's stored style and persists it
    /// as a new record. Two identical calls create two separate records.
    ///
    /// Rejected before any model call when the topic is invalid or the user
    /// has never analyzed their style.
    pub async fn generate(
        &self,
        user_id: Uuid,
        topic: &str,
        language: Language,
        length: Option<i32>,
    ) -> Result<GeneratedPost, WorkflowError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(WorkflowError::EmptyTopic);
        }
        if topic.chars().count() > MAX_TOPIC_LENGTH {
            return Err(WorkflowError::TopicTooLong);
        }

        let profile = self
            .db
            .get_style_profile(user_id)
            .await?
            .ok_or(WorkflowError::NoProfile)?;

        let target_length = resolve_target_length(length, profile.typical_length);

        let generated = self
            .generation
            .generate_post(topic, &profile.descriptor(), language, target_length)
            .await;

        let post = self
            .db
            .create_generated_post(user_id, topic, language, target_length, &generated.text)
            .await?;
        Ok(post)
    }
}

/// Target length resolution: an explicit positive request value wins, then a
/// positive stored typical length, then the fixed default of 250.
fn resolve_target_length(requested: Option<i32>, stored_typical: i32) -> i32 {
    if let Some(len) = requested {
        if len > 0 {
            return len;
        }
    }
    if stored_typical > 0 {
        stored_typical
    } else {
        DEFAULT_TARGET_LENGTH
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        GeneratedText, GenerationSource, RawSample, StyleAnalysis, StyleDescriptor, User,
        UserCredentials,
    };
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory stand-in for the database port. Samples are kept in
    /// insertion order; `recent_raw_samples` returns them newest-first the
    /// way the real adapter orders by created_at DESC.
    #[derive(Default)]
    struct MockDb {
        samples: Mutex<Vec<RawSample>>,
        profile: Mutex<Option<StyleProfile>>,
        posts: Mutex<Vec<GeneratedPost>>,
    }

    impl MockDb {
        fn with_samples(texts: &[&str]) -> Self {
            let db = Self::default();
            let base = Utc::now();
            let mut samples = db.samples.lock().unwrap();
            for (i, text) in texts.iter().enumerate() {
                samples.push(RawSample {
                    id: Uuid::new_v4(),
                    user_id: Uuid::nil(),
                    raw_text: text.to_string(),
                    created_at: base + Duration::seconds(i as i64),
                });
            }
            drop(samples);
            db
        }

        fn with_profile(typical_length: i32) -> Self {
            let db = Self::default();
            *db.profile.lock().unwrap() = Some(StyleProfile {
                user_id: Uuid::nil(),
                tone_summary: "Warm and upbeat".to_string(),
                structure_summary: "One-liners".to_string(),
                vocabulary_keywords: vec!["thrilled".to_string()],
                typical_length,
                analyzed_at: Utc::now(),
            });
            db
        }
    }

    #[async_trait]
    impl DatabaseService for MockDb {
        async fn create_user(
            &self,
            _username: &str,
            _email: &str,
            _hashed_password: &str,
        ) -> PortResult<User> {
            unimplemented!("not exercised by workflow tests")
        }

        async fn get_user_by_id(&self, _user_id: Uuid) -> PortResult<User> {
            unimplemented!("not exercised by workflow tests")
        }

        async fn get_user_by_email(&self, _email: &str) -> PortResult<UserCredentials> {
            unimplemented!("not exercised by workflow tests")
        }

        async fn create_auth_session(
            &self,
            _session_id: &str,
            _user_id: Uuid,
            _expires_at: DateTime<Utc>,
        ) -> PortResult<()> {
            unimplemented!("not exercised by workflow tests")
        }

        async fn validate_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
            unimplemented!("not exercised by workflow tests")
        }

        async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
            unimplemented!("not exercised by workflow tests")
        }

        async fn create_raw_samples(
            &self,
            user_id: Uuid,
            texts: &[String],
        ) -> PortResult<usize> {
            let mut samples = self.samples.lock().unwrap();
            let base = Utc::now();
            for (i, text) in texts.iter().enumerate() {
                samples.push(RawSample {
                    id: Uuid::new_v4(),
                    user_id,
                    raw_text: text.clone(),
                    created_at: base + Duration::seconds(i as i64),
                });
            }
            Ok(texts.len())
        }

        async fn recent_raw_samples(
            &self,
            _user_id: Uuid,
            limit: i64,
        ) -> PortResult<Vec<RawSample>> {
            let samples = self.samples.lock().unwrap();
            let mut recent: Vec<RawSample> = samples.clone();
            recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            recent.truncate(limit as usize);
            Ok(recent)
        }

        async fn count_raw_samples(&self, _user_id: Uuid) -> PortResult<i64> {
            Ok(self.samples.lock().unwrap().len() as i64)
        }

        async fn upsert_style_profile(
            &self,
            user_id: Uuid,
            descriptor: &StyleDescriptor,
        ) -> PortResult<StyleProfile> {
            let profile = StyleProfile {
                user_id,
                tone_summary: descriptor.tone_summary.clone(),
                structure_summary: descriptor.structure_summary.clone(),
                vocabulary_keywords: descriptor.vocabulary_keywords.clone(),
                typical_length: descriptor.typical_length,
                analyzed_at: Utc::now(),
            };
            *self.profile.lock().unwrap() = Some(profile.clone());
            Ok(profile)
        }

        async fn get_style_profile(&self, _user_id: Uuid) -> PortResult<Option<StyleProfile>> {
            Ok(self.profile.lock().unwrap().clone())
        }

        async fn create_generated_post(
            &self,
            user_id: Uuid,
            topic: &str,
            language: Language,
            target_length: i32,
            generated_text: &str,
        ) -> PortResult<GeneratedPost> {
            let post = GeneratedPost {
                id: Uuid::new_v4(),
                user_id,
                topic: topic.to_string(),
                language,
                target_length,
                generated_text: generated_text.to_string(),
                created_at: Utc::now(),
            };
            self.posts.lock().unwrap().push(post.clone());
            Ok(post)
        }

        async fn get_generated_post(
            &self,
            _user_id: Uuid,
            post_id: Uuid,
        ) -> PortResult<GeneratedPost> {
            self.posts
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == post_id)
                .cloned()
                .ok_or_else(|| PortError::NotFound(post_id.to_string()))
        }

        async fn list_generated_posts(&self, _user_id: Uuid) -> PortResult<Vec<GeneratedPost>> {
            Ok(self.posts.lock().unwrap().clone())
        }
    }

    /// Counts invocations and records the text it was handed.
    #[derive(Default)]
    struct MockStyle {
        calls: AtomicUsize,
        last_input: Mutex<Option<String>>,
    }

    #[async_trait]
    impl StyleAnalysisService for MockStyle {
        async fn analyze_style(&self, samples_text: &str) -> StyleAnalysis {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock().unwrap() = Some(samples_text.to_string());
            StyleAnalysis {
                descriptor: StyleDescriptor {
                    tone_summary: "Analytical".to_string(),
                    structure_summary: "Numbered lists".to_string(),
                    vocabulary_keywords: vec!["data".to_string(), "insight".to_string()],
                    typical_length: 180,
                },
                source: DescriptorSource::Model,
            }
        }
    }

    #[derive(Default)]
    struct MockGeneration {
        calls: AtomicUsize,
        last_length: AtomicUsize,
    }

    #[async_trait]
    impl PostGenerationService for MockGeneration {
        async fn generate_post(
            &self,
            topic: &str,
            _descriptor: &StyleDescriptor,
            _language: Language,
            target_length: i32,
        ) -> GeneratedText {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_length
                .store(target_length as usize, Ordering::SeqCst);
            GeneratedText {
                text: format!("A post about {}", topic),
                source: GenerationSource::Model,
            }
        }
    }

    fn workflow(db: MockDb) -> (Workflow, Arc<MockDb>, Arc<MockStyle>, Arc<MockGeneration>) {
        let db = Arc::new(db);
        let style = Arc::new(MockStyle::default());
        let generation = Arc::new(MockGeneration::default());
        let wf = Workflow::new(db.clone(), style.clone(), generation.clone());
        (wf, db, style, generation)
    }

    // --- Pure helper tests ---

    #[test]
    fn split_is_strict_on_every_separator_occurrence() {
        assert_eq!(
            split_blocks("  A  ---   ---B---C", "---"),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn split_trims_and_drops_empty_blocks() {
        assert_eq!(
            split_blocks("--- first post ---\n\n---  second post  ---", "---"),
            vec!["first post".to_string(), "second post".to_string()]
        );
        assert!(split_blocks("--- --- ---", "---").is_empty());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multibyte: counting chars, not bytes.
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    // --- Upload ---

    #[tokio::test]
    async fn upload_persists_at_most_fifteen_blocks_in_order() {
        let (wf, db, _, _) = workflow(MockDb::default());
        let text = (1..=20)
            .map(|i| format!("post number {}", i))
            .collect::<Vec<_>>()
            .join("\n---\n");

        let persisted = wf.upload_samples(Uuid::nil(), &text).await.unwrap();
        assert_eq!(persisted, 15);

        let samples = db.samples.lock().unwrap();
        assert_eq!(samples.len(), 15);
        assert_eq!(samples[0].raw_text, "post number 1");
        assert_eq!(samples[14].raw_text, "post number 15");
    }

    #[tokio::test]
    async fn upload_with_no_nonempty_blocks_is_rejected() {
        let (wf, db, _, _) = workflow(MockDb::default());
        let err = wf.upload_samples(Uuid::nil(), "  ---  --- ").await.unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyUpload));
        assert!(db.samples.lock().unwrap().is_empty());
    }

    // --- Analyze ---

    #[tokio::test]
    async fn analyze_without_samples_makes_no_model_call() {
        let (wf, _, style, _) = workflow(MockDb::default());
        let err = wf.analyze(Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NoSamples));
        assert_eq!(style.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn analyze_joins_at_most_ten_recent_samples() {
        let texts: Vec<String> = (1..=12).map(|i| format!("sample {}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let (wf, _, style, _) = workflow(MockDb::with_samples(&refs));

        wf.analyze(Uuid::nil()).await.unwrap();

        let input = style.last_input.lock().unwrap().clone().unwrap();
        // Newest first, oldest two cut off.
        assert!(input.starts_with("sample 12"));
        assert!(input.contains("sample 3"));
        assert!(!input.contains("sample 2\n"));
        assert_eq!(input.matches(SAMPLE_JOIN).count(), 9);
    }

    #[tokio::test]
    async fn reanalysis_overwrites_every_profile_field() {
        let (wf, db, _, _) = workflow(MockDb::with_samples(&["a sample"]));
        // Seed a prior profile with different values everywhere.
        db.upsert_style_profile(
            Uuid::nil(),
            &StyleDescriptor {
                tone_summary: "old tone".to_string(),
                structure_summary: "old structure".to_string(),
                vocabulary_keywords: vec!["old".to_string()],
                typical_length: 999,
            },
        )
        .await
        .unwrap();

        let (profile, source) = wf.analyze(Uuid::nil()).await.unwrap();
        assert_eq!(source, DescriptorSource::Model);
        assert_eq!(profile.tone_summary, "Analytical");
        assert_eq!(profile.structure_summary, "Numbered lists");
        assert_eq!(profile.vocabulary_keywords, vec!["data", "insight"]);
        assert_eq!(profile.typical_length, 180);
    }

    // --- Generate ---

    #[tokio::test]
    async fn generate_without_profile_makes_no_model_call() {
        let (wf, db, _, generation) = workflow(MockDb::default());
        let err = wf
            .generate(Uuid::nil(), "launch day", Language::English, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NoProfile));
        assert_eq!(generation.calls.load(Ordering::SeqCst), 0);
        assert!(db.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn generate_rejects_blank_and_oversized_topics() {
        let (wf, _, _, generation) = workflow(MockDb::with_profile(250));

        let err = wf
            .generate(Uuid::nil(), "   ", Language::English, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyTopic));

        let long_topic = "x".repeat(MAX_TOPIC_LENGTH + 1);
        let err = wf
            .generate(Uuid::nil(), &long_topic, Language::English, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::TopicTooLong));

        assert_eq!(generation.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn target_length_falls_back_to_250_when_profile_length_is_zero() {
        let (wf, _, _, generation) = workflow(MockDb::with_profile(0));
        wf.generate(Uuid::nil(), "hiring", Language::English, None)
            .await
            .unwrap();
        assert_eq!(generation.last_length.load(Ordering::SeqCst), 250);
    }

    #[tokio::test]
    async fn target_length_prefers_stored_typical_length() {
        let (wf, _, _, generation) = workflow(MockDb::with_profile(120));
        let post = wf
            .generate(Uuid::nil(), "hiring", Language::Hindi, None)
            .await
            .unwrap();
        assert_eq!(generation.last_length.load(Ordering::SeqCst), 120);
        assert_eq!(post.target_length, 120);
        assert_eq!(post.language, Language::Hindi);
    }

    #[tokio::test]
    async fn explicit_request_length_overrides_stored_length() {
        let (wf, _, _, generation) = workflow(MockDb::with_profile(120));
        wf.generate(Uuid::nil(), "hiring", Language::English, Some(400))
            .await
            .unwrap();
        assert_eq!(generation.last_length.load(Ordering::SeqCst), 400);

        // Zero and negative request lengths are ignored.
        wf.generate(Uuid::nil(), "hiring", Language::English, Some(0))
            .await
            .unwrap();
        assert_eq!(generation.last_length.load(Ordering::SeqCst), 120);
    }

    #[tokio::test]
    async fn identical_generate_calls_create_separate_records() {
        let (wf, db, _, _) = workflow(MockDb::with_profile(250));
        let first = wf
            .generate(Uuid::nil(), "launch day", Language::English, None)
            .await
            .unwrap();
        let second = wf
            .generate(Uuid::nil(), "launch day", Language::English, None)
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(db.posts.lock().unwrap().len(), 2);
    }
}
