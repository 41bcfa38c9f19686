//! Client for the external text-generation service.
//!
//! The service is treated as an opaque text-completion endpoint with an
//! OpenAI-compatible chat API: one user-role prompt in, one completion out.
//! There is no internal retry and no timeout beyond reqwest's defaults; a
//! failure here aborts the calling pipeline before any persistence.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub struct TextGenerator {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

impl TextGenerator {
    pub fn new(endpoint: String, api_key: String, model: String, temperature: f32) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            temperature,
        }
    }

    /// Generate narrative text for the given prompt. Returns the first
    /// completion, trimmed of surrounding whitespace.
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = GenerationRequest {
            model: &self.model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens,
        };

        debug!(
            "Requesting completion ({} prompt chars, {max_tokens} max tokens)",
            prompt.len()
        );
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::External(format!("text generation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::External(format!(
                "text generation returned status {status}"
            )));
        }

        let body: GenerationResponse = response
            .json()
            .await
            .map_err(|e| Error::External(format!("malformed completion response: {e}")))?;
        first_completion(body)
    }
}

/// Extract the first completion's trimmed text.
fn first_completion(body: GenerationResponse) -> Result<String> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::External("completion response had no choices".to_string()))?;
    Ok(choice.message.content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_completion_trimmed() {
        let body: GenerationResponse = serde_json::from_str(
            r#"{"choices": [
                {"message": {"role": "assistant", "content": "  narrative text \n"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(first_completion(body).unwrap(), "narrative text");
    }

    #[test]
    fn empty_choices_is_an_external_failure() {
        let body: GenerationResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_completion(body), Err(Error::External(_))));
    }
}
