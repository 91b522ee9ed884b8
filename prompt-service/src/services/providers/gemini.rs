//! Gemini provider implementation.
//!
//! Sends the session history to Google's Gemini API with the
//! requirement-engineer system instruction and strict-JSON output rules, and
//! normalizes the reply into [`PromptReply`].

use super::{ChatProvider, ChatTurn, ProviderError};
use crate::models::PromptReply;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Persona under which the model conducts the interview.
const SYSTEM_INSTRUCTION: &str = "You are a Requirement Engineer. Your goal is to gather details \
     to create an optimized AI prompt. Ask one question at a time. If you have enough info, \
     provide a summary and then the final prompt.";

/// Output contract appended as the trailing user turn of every request.
const JSON_RULES: &str = "Return ONLY strict JSON. No markdown, no extra keys, no commentary.\n\
     Required schema:\n\
     {\n\
     \x20\x20\"status\": \"collecting\" | \"delivered\",\n\
     \x20\x20\"question_text\": \"string\",\n\
     \x20\x20\"ui_elements\": [\n\
     \x20\x20\x20\x20{\n\
     \x20\x20\x20\x20\x20\x20\"type\": \"radio\" | \"checkbox\" | \"text\",\n\
     \x20\x20\x20\x20\x20\x20\"options\": [\"string\", ...]\n\
     \x20\x20\x20\x20}\n\
     \x20\x20],\n\
     \x20\x20\"final_prompt\": \"string\"\n\
     }\n\
     When type is radio, every option must start with '( ) '.\n\
     When type is checkbox, every option must start with '[ ] '.\n\
     When type is text, options must be [].";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

/// Gemini chat provider.
pub struct GeminiChatProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiChatProvider {
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            GEMINI_API_BASE, self.config.model, method, self.config.api_key
        )
    }

    fn build_request(&self, history: &[ChatTurn]) -> GenerateContentRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                role: Some(turn.role.clone()),
                parts: vec![ContentPart {
                    text: turn.content.clone(),
                }],
            })
            .collect();

        // The output contract rides along as a final user turn, mirroring the
        // conversation format the model was prompted with.
        contents.push(Content {
            role: Some("user".to_string()),
            parts: vec![ContentPart {
                text: JSON_RULES.to_string(),
            }],
        });

        GenerateContentRequest {
            contents,
            system_instruction: Some(Content {
                role: None,
                parts: vec![ContentPart {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.2),
                response_mime_type: Some("application/json".to_string()),
            }),
        }
    }
}

#[async_trait]
impl ChatProvider for GeminiChatProvider {
    async fn next_turn(&self, history: &[ChatTurn]) -> Result<PromptReply, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let request = self.build_request(history);
        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            turns = history.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        let text = api_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| ProviderError::InvalidReply("Gemini returned no text".to_string()))?;

        let raw: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidReply(format!("Reply is not valid JSON: {}", e)))?;

        if !raw.is_object() {
            return Err(ProviderError::InvalidReply(
                "Gemini returned non-object JSON".to_string(),
            ));
        }

        Ok(PromptReply::from_raw(&raw))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        // Try to list models to verify API key works
        let url = format!("{}/models?key={}", GEMINI_API_BASE, self.config.api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiChatProvider {
        GeminiChatProvider::new(GeminiConfig {
            api_key: "test-key".to_string(),
            model: "gemini-2.5-flash".to_string(),
        })
    }

    #[test]
    fn request_appends_json_rules_as_user_turn() {
        let history = vec![
            ChatTurn {
                role: "user".to_string(),
                content: "I need a prompt".to_string(),
            },
            ChatTurn {
                role: "model".to_string(),
                content: "{\"status\":\"collecting\"}".to_string(),
            },
        ];

        let request = provider().build_request(&history);
        assert_eq!(request.contents.len(), 3);

        let trailer = request.contents.last().unwrap();
        assert_eq!(trailer.role.as_deref(), Some("user"));
        assert!(trailer.parts[0].text.starts_with("Return ONLY strict JSON"));
    }

    #[test]
    fn request_serializes_in_camel_case() {
        let request = provider().build_request(&[]);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("systemInstruction").is_some());
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
    }

    #[test]
    fn api_url_contains_model_and_key() {
        let url = provider().api_url("generateContent");
        assert!(url.contains("/models/gemini-2.5-flash:generateContent"));
        assert!(url.ends_with("key=test-key"));
    }
}
