//! Reason writer backed by an OpenAI-compatible chat completion endpoint.
//!
//! Requires the `llm` feature. Output is best-effort: the recommender
//! replaces any error or empty reply with a template reason.

use crate::reason::{ReasonContext, ReasonWriter};
use crate::{RankError, RankResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl ChatConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: OPENAI_CHAT_URL.to_string(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 60,
            temperature: 0.3,
            timeout_secs: 10,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

pub struct ChatReasons {
    config: ChatConfig,
    client: reqwest::Client,
}

impl ChatReasons {
    pub fn new(config: ChatConfig) -> RankResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RankError::Reason(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn prompt(ctx: &ReasonContext<'_>) -> String {
        format!(
            "A listener describes their taste as: \"{}\".\n\
             In one short sentence, tell them why they might enjoy the {} \"{}\".\n\
             The strongest ranking signal was {}.",
            ctx.profile.preference_text(),
            ctx.candidate.kind,
            ctx.candidate.title,
            ctx.dominant,
        )
    }
}

/// First choice's text, trimmed.
fn parse_reply(body: &str) -> RankResult<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RankError::Reason(format!("invalid completion response: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| RankError::Reason("completion response had no text".to_string()))
}

#[async_trait]
impl ReasonWriter for ChatReasons {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn write_reason(&self, ctx: &ReasonContext<'_>) -> RankResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You write one-sentence podcast and book recommendations.".to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::prompt(ctx),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RankError::Reason(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RankError::Reason(e.to_string()))?;
        if !status.is_success() {
            return Err(RankError::Reason(format!("completion API error {}: {}", status, body)));
        }
        parse_reply(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use crate::profile::UserProfile;
    use crate::signals::{Signal, Signals};
    use margin_core::EntityKind;

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "  A fresh take on habits. "}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "A fresh take on habits.");
    }

    #[test]
    fn empty_or_malformed_replies_are_errors() {
        assert!(parse_reply(r#"{"choices": []}"#).is_err());
        assert!(parse_reply(r#"{"choices": [{"message": {"content": "   "}}]}"#).is_err());
        assert!(parse_reply("not json").is_err());
    }

    #[test]
    fn prompt_names_the_candidate() {
        let profile = UserProfile::new().with_topic("habits", 1.0);
        let candidate = Candidate::new("b1", EntityKind::Book, "Atomic Habits", "Atomic Habits");
        let ctx = ReasonContext {
            profile: &profile,
            candidate: &candidate,
            signals: Signals::default(),
            dominant: Signal::TopicMatch,
            matched_topics: vec!["habits".into()],
        };

        let prompt = ChatReasons::prompt(&ctx);
        assert!(prompt.contains("\"habits\""));
        assert!(prompt.contains("book \"Atomic Habits\""));
        assert!(prompt.contains("topic_match"));
    }
}
