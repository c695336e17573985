//! SongAssistClient: the song-assistance collaborator
//!
//! An opaque external chat-completions service provides three text
//! operations: a chord progression for a song name, feedback comparing a
//! played vs expected chord, and a song recommendation for a free-text
//! query. Only the request/response boundary is modeled here; the
//! service's content is passed through verbatim.

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use crate::config::AssistConfig;
use crate::detection::ChordLabel;

/// HTTP client for the assistance service.
pub struct SongAssistClient {
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl SongAssistClient {
    /// Build a client from configuration. The API key is read from the
    /// configured environment variable; requests without one are sent
    /// unauthenticated and left to the service to reject.
    pub fn new(config: &AssistConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            log::warn!(
                "[SongAssist] No API key in ${}; assistance requests may be rejected",
                config.api_key_env
            );
        }
        Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    /// Fetch a chord progression for a song name.
    pub async fn chord_progression(&self, song_name: &str) -> Result<String> {
        let prompt = format!(
            "You are a guitar teacher. Give the chord progression for the song '{}' in a simple list, using standard guitar chord names.",
            song_name
        );
        self.chat(&prompt).await
    }

    /// Fetch feedback comparing a played chord against the expected one.
    pub async fn chord_feedback(&self, played: &str, expected: &str) -> Result<String> {
        let prompt = format!(
            "The student played '{}', but the expected chord was '{}'. Give short feedback (correct/incorrect, and a tip if wrong).",
            played, expected
        );
        self.chat(&prompt).await
    }

    /// Fetch a song recommendation for a free-text query.
    pub async fn recommend_song(&self, query: &str) -> Result<String> {
        let prompt = format!(
            "Suggest a popular guitar song to learn based on: {}. Give the song name and artist.",
            query
        );
        self.chat(&prompt).await
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": "You are a helpful guitar teacher."},
                {"role": "user", "content": prompt},
            ],
            "max_tokens": self.max_tokens,
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("sending assistance request")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "assistance service returned {}",
                response.status()
            ));
        }

        let payload: serde_json::Value =
            response.json().await.context("decoding assistance response")?;
        payload
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("assistance response missing message content"))
    }
}

/// Split a progression text payload into chord labels.
///
/// Progressions arrive as free text; tokens are separated by whitespace,
/// commas, or newlines, matching how the teach-song flow consumes them.
pub fn parse_progression(text: &str) -> Vec<ChordLabel> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .filter_map(ChordLabel::parse)
        .collect()
}
