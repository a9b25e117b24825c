//! services/api/src/adapters/post_llm.rs
//!
//! This module contains the adapter for the post-generating LLM.
//! It implements the `PostGenerationService` port from the `core` crate.
//!
//! The response text is returned verbatim: no post-parsing and no length
//! enforcement. A failed call yields a fixed templated string instead of an
//! error, so generation always produces some text.

const POST_PROMPT_TEMPLATE: &str = r#"USER STYLE:
- Tone: {tone}
- Structure: {structure}
- Keywords: {keywords}
- Typical length: {length} words

Write a social media post about "{topic}" in {language}.
Match the exact style above. Sound human, not AI-generated.
Target {length} words."#;

/// At most this many keywords are embedded in the prompt.
const MAX_PROMPT_KEYWORDS: usize = 10;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use postcraft_core::domain::{GeneratedText, GenerationSource, Language, StyleDescriptor};
use postcraft_core::ports::{PortError, PortResult, PostGenerationService};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PostGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPostAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPostAdapter {
    /// Creates a new `OpenAiPostAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    async fn complete(&self, prompt: String) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Post LLM response contained no text content.".to_string())
            })
    }
}

//=========================================================================================
// Prompt Construction and Fallback
//=========================================================================================

fn build_prompt(
    topic: &str,
    descriptor: &StyleDescriptor,
    language: Language,
    target_length: i32,
) -> String {
    let keywords = descriptor
        .vocabulary_keywords
        .iter()
        .take(MAX_PROMPT_KEYWORDS)
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    POST_PROMPT_TEMPLATE
        .replace("{tone}", &descriptor.tone_summary)
        .replace("{structure}", &descriptor.structure_summary)
        .replace("{keywords}", &keywords)
        .replace("{length}", &target_length.to_string())
        .replace("{topic}", topic)
        .replace("{language}", &language.to_string())
}

/// The fixed templated string returned when the model call fails.
fn fallback_text(topic: &str, descriptor: &StyleDescriptor) -> String {
    let tone = if descriptor.tone_summary.trim().is_empty() {
        "Professional tone"
    } else {
        descriptor.tone_summary.as_str()
    };
    format!("Excited to share about {}! 🎉\n\n{}", topic, tone)
}

//=========================================================================================
// `PostGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PostGenerationService for OpenAiPostAdapter {
    async fn generate_post(
        &self,
        topic: &str,
        descriptor: &StyleDescriptor,
        language: Language,
        target_length: i32,
    ) -> GeneratedText {
        let prompt = build_prompt(topic, descriptor, language, target_length);

        match self.complete(prompt).await {
            Ok(text) => GeneratedText {
                text,
                source: GenerationSource::Model,
            },
            Err(e) => {
                warn!("Post LLM call failed ({}); using templated fallback", e);
                GeneratedText {
                    text: fallback_text(topic, descriptor),
                    source: GenerationSource::CallFallback,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor_with_keywords(count: usize) -> StyleDescriptor {
        StyleDescriptor {
            tone_summary: "Candid and warm.".to_string(),
            structure_summary: "Short paragraphs.".to_string(),
            vocabulary_keywords: (0..count).map(|i| format!("kw{}", i)).collect(),
            typical_length: 200,
        }
    }

    #[test]
    fn prompt_embeds_style_topic_language_and_length() {
        let prompt = build_prompt(
            "shipping our v2",
            &descriptor_with_keywords(2),
            Language::Hindi,
            120,
        );
        assert!(prompt.contains("- Tone: Candid and warm."));
        assert!(prompt.contains("- Structure: Short paragraphs."));
        assert!(prompt.contains("- Keywords: kw0, kw1"));
        assert!(prompt.contains("Target 120 words."));
        assert!(prompt.contains("\"shipping our v2\" in Hindi"));
    }

    #[test]
    fn prompt_caps_keywords_at_ten() {
        let prompt = build_prompt(
            "anything",
            &descriptor_with_keywords(14),
            Language::English,
            250,
        );
        assert!(prompt.contains("kw9"));
        assert!(!prompt.contains("kw10"));
    }

    #[test]
    fn fallback_interpolates_topic_and_tone() {
        let text = fallback_text("launch day", &descriptor_with_keywords(0));
        assert_eq!(text, "Excited to share about launch day! 🎉\n\nCandid and warm.");
    }

    #[test]
    fn fallback_defaults_the_tone_when_empty() {
        let mut descriptor = descriptor_with_keywords(0);
        descriptor.tone_summary = "   ".to_string();
        let text = fallback_text("launch day", &descriptor);
        assert!(text.ends_with("Professional tone"));
    }
}
