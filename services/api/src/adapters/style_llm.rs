//! services/api/src/adapters/style_llm.rs
//!
//! This module contains the adapter for the style-extraction LLM.
//! It implements the `StyleAnalysisService` port from the `core` crate.
//!
//! The port is infallible by contract: a failed call or an unparseable
//! response yields the fixed fallback descriptor, with the cause recorded in
//! the returned outcome so tests and logs can tell the paths apart.

const STYLE_PROMPT_TEMPLATE: &str = r#"Analyze these social media posts and extract the writing style in JSON format:

POSTS: {posts}

Return ONLY valid JSON:
{
    "tone_summary": "2-3 sentences about tone/emotion",
    "structure_summary": "How posts are structured (paragraphs, lists, etc)",
    "vocabulary_keywords": ["word1", "word2", "phrase1"],
    "typical_length": 250
}"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use postcraft_core::domain::{DescriptorSource, StyleAnalysis, StyleDescriptor};
use postcraft_core::ports::{PortError, PortResult, StyleAnalysisService};
use postcraft_core::workflow::{truncate_chars, ANALYSIS_CHAR_BUDGET};
use serde::Deserialize;
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StyleAnalysisService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiStyleAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiStyleAdapter {
    /// Creates a new `OpenAiStyleAdapter`.
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
                PortError::Unexpected("Style LLM response contained no text content.".to_string())
            })
    }
}

//=========================================================================================
// Prompt Construction and Response Parsing
//=========================================================================================

/// Builds the extraction prompt, cutting the sample text to the character
/// budget first so oversized uploads cannot inflate prompt cost.
fn build_prompt(samples_text: &str) -> String {
    STYLE_PROMPT_TEMPLATE.replace("{posts}", truncate_chars(samples_text, ANALYSIS_CHAR_BUDGET))
}

/// The exact JSON shape the prompt asks for. All four fields are required;
/// anything else is a parse failure.
#[derive(Deserialize)]
struct DescriptorJson {
    tone_summary: String,
    structure_summary: String,
    vocabulary_keywords: Vec<String>,
    typical_length: i32,
}

/// Extracts the outermost `{...}` span, tolerating code fences or prose
/// around the JSON object models sometimes add.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn parse_descriptor(raw: &str) -> Option<StyleDescriptor> {
    let object = extract_json_object(raw)?;
    let parsed: DescriptorJson = serde_json::from_str(object).ok()?;
    Some(StyleDescriptor {
        tone_summary: parsed.tone_summary,
        structure_summary: parsed.structure_summary,
        vocabulary_keywords: parsed.vocabulary_keywords,
        typical_length: parsed.typical_length,
    })
}

//=========================================================================================
// `StyleAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StyleAnalysisService for OpenAiStyleAdapter {
    async fn analyze_style(&self, samples_text: &str) -> StyleAnalysis {
        let prompt = build_prompt(samples_text);

        match self.complete(prompt).await {
            Ok(raw) => match parse_descriptor(&raw) {
                Some(descriptor) => StyleAnalysis {
                    descriptor,
                    source: DescriptorSource::Model,
                },
                None => {
                    warn!("Style LLM response did not parse as a descriptor; using fallback");
                    StyleAnalysis {
                        descriptor: StyleDescriptor::fallback(),
                        source: DescriptorSource::ParseFallback,
                    }
                }
            },
            Err(e) => {
                warn!("Style LLM call failed ({}); using fallback", e);
                StyleAnalysis {
                    descriptor: StyleDescriptor::fallback(),
                    source: DescriptorSource::CallFallback,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_truncates_input_to_the_character_budget() {
        let marker = "OVERFLOW";
        let input = format!("{}{}", "x".repeat(ANALYSIS_CHAR_BUDGET), marker);
        let prompt = build_prompt(&input);
        assert!(!prompt.contains(marker));
        assert!(prompt.contains(&"x".repeat(ANALYSIS_CHAR_BUDGET)));
    }

    #[test]
    fn prompt_embeds_short_input_verbatim() {
        let prompt = build_prompt("Just shipped a new feature!");
        assert!(prompt.contains("POSTS: Just shipped a new feature!"));
        assert!(prompt.contains("Return ONLY valid JSON"));
    }

    #[test]
    fn parses_a_plain_json_descriptor() {
        let raw = r#"{
            "tone_summary": "Upbeat and personal.",
            "structure_summary": "Hook, then a short story, then a question.",
            "vocabulary_keywords": ["grateful", "journey"],
            "typical_length": 180
        }"#;
        let descriptor = parse_descriptor(raw).unwrap();
        assert_eq!(descriptor.tone_summary, "Upbeat and personal.");
        assert_eq!(descriptor.vocabulary_keywords, vec!["grateful", "journey"]);
        assert_eq!(descriptor.typical_length, 180);
    }

    #[test]
    fn parses_json_wrapped_in_code_fences_and_prose() {
        let raw = "Here is the style analysis:\n```json\n{\"tone_summary\": \"Dry\", \
                   \"structure_summary\": \"Lists\", \"vocabulary_keywords\": [], \
                   \"typical_length\": 90}\n```\nLet me know if you need more.";
        let descriptor = parse_descriptor(raw).unwrap();
        assert_eq!(descriptor.tone_summary, "Dry");
        assert_eq!(descriptor.typical_length, 90);
    }

    #[test]
    fn rejects_responses_missing_a_field() {
        let raw = r#"{"tone_summary": "Dry", "structure_summary": "Lists", "typical_length": 90}"#;
        assert!(parse_descriptor(raw).is_none());
        assert!(parse_descriptor("no json here at all").is_none());
        assert!(parse_descriptor("} backwards {").is_none());
    }

    #[test]
    fn fallback_descriptor_is_fully_populated() {
        let fallback = StyleDescriptor::fallback();
        assert!(!fallback.tone_summary.is_empty());
        assert!(!fallback.structure_summary.is_empty());
        assert_eq!(fallback.vocabulary_keywords.len(), 4);
        assert_eq!(fallback.typical_length, 250);
    }
}
