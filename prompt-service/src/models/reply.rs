//! Structured reply produced by the requirement-engineering model.
//!
//! Gemini is instructed to answer with strict JSON; replies are normalized
//! here so clients always receive the full schema with well-formed options.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const RADIO_PREFIX: &str = "( ) ";
const CHECKBOX_PREFIX: &str = "[ ] ";

/// Where the conversation stands: still gathering requirements, or the final
/// prompt has been delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Collecting,
    Delivered,
}

/// Input widget the frontend should render for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UiElementKind {
    Radio,
    Checkbox,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UiElement {
    #[serde(rename = "type")]
    pub kind: UiElementKind,
    pub options: Vec<String>,
}

/// One model turn, as returned to the client and persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromptReply {
    pub status: ReplyStatus,
    pub question_text: String,
    pub ui_elements: Vec<UiElement>,
    pub final_prompt: String,
}

impl PromptReply {
    /// Normalize a raw model reply into the strict schema.
    ///
    /// Rules: unknown status falls back to `collecting`; non-string text
    /// fields become empty; elements with an unknown type are dropped; radio
    /// and checkbox options get their marker prefix when missing; text
    /// elements never carry options.
    pub fn from_raw(raw: &serde_json::Value) -> Self {
        let status = match raw.get("status").and_then(|s| s.as_str()) {
            Some("delivered") => ReplyStatus::Delivered,
            _ => ReplyStatus::Collecting,
        };

        let question_text = raw
            .get("question_text")
            .and_then(|q| q.as_str())
            .unwrap_or_default()
            .to_string();

        let final_prompt = raw
            .get("final_prompt")
            .and_then(|p| p.as_str())
            .unwrap_or_default()
            .to_string();

        let ui_elements = raw
            .get("ui_elements")
            .and_then(|e| e.as_array())
            .map(|elements| {
                elements
                    .iter()
                    .filter_map(normalize_element)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Self {
            status,
            question_text,
            ui_elements,
            final_prompt,
        }
    }
}

fn normalize_element(raw: &serde_json::Value) -> Option<UiElement> {
    let kind = match raw.get("type").and_then(|t| t.as_str())? {
        "radio" => UiElementKind::Radio,
        "checkbox" => UiElementKind::Checkbox,
        "text" => UiElementKind::Text,
        _ => return None,
    };

    let raw_options = raw
        .get("options")
        .and_then(|o| o.as_array())
        .cloned()
        .unwrap_or_default();

    let cleaned: Vec<String> = raw_options
        .iter()
        .map(|opt| match opt.as_str() {
            Some(s) => s.trim().to_string(),
            None => opt.to_string().trim().to_string(),
        })
        .collect();

    let options = match kind {
        UiElementKind::Radio => cleaned
            .into_iter()
            .map(|opt| ensure_prefix(opt, RADIO_PREFIX))
            .collect(),
        UiElementKind::Checkbox => cleaned
            .into_iter()
            .map(|opt| ensure_prefix(opt, CHECKBOX_PREFIX))
            .collect(),
        UiElementKind::Text => Vec::new(),
    };

    Some(UiElement { kind, options })
}

fn ensure_prefix(opt: String, prefix: &str) -> String {
    if opt.starts_with(prefix) {
        opt
    } else {
        format!("{}{}", prefix, opt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_complete_reply() {
        let raw = json!({
            "status": "collecting",
            "question_text": "What is the target audience?",
            "ui_elements": [
                {"type": "radio", "options": ["Developers", "( ) Designers"]},
                {"type": "checkbox", "options": ["Web", "[ ] Mobile"]},
                {"type": "text", "options": ["should be dropped"]}
            ],
            "final_prompt": ""
        });

        let reply = PromptReply::from_raw(&raw);
        assert_eq!(reply.status, ReplyStatus::Collecting);
        assert_eq!(reply.question_text, "What is the target audience?");
        assert_eq!(
            reply.ui_elements[0].options,
            vec!["( ) Developers", "( ) Designers"]
        );
        assert_eq!(reply.ui_elements[1].options, vec!["[ ] Web", "[ ] Mobile"]);
        assert!(reply.ui_elements[2].options.is_empty());
    }

    #[test]
    fn unknown_status_falls_back_to_collecting() {
        let reply = PromptReply::from_raw(&json!({"status": "thinking"}));
        assert_eq!(reply.status, ReplyStatus::Collecting);
    }

    #[test]
    fn delivered_status_is_kept() {
        let raw = json!({"status": "delivered", "final_prompt": "Write a haiku."});
        let reply = PromptReply::from_raw(&raw);
        assert_eq!(reply.status, ReplyStatus::Delivered);
        assert_eq!(reply.final_prompt, "Write a haiku.");
    }

    #[test]
    fn non_string_fields_become_empty() {
        let raw = json!({"question_text": 42, "final_prompt": ["x"], "ui_elements": "nope"});
        let reply = PromptReply::from_raw(&raw);
        assert_eq!(reply.question_text, "");
        assert_eq!(reply.final_prompt, "");
        assert!(reply.ui_elements.is_empty());
    }

    #[test]
    fn unknown_element_types_are_dropped() {
        let raw = json!({
            "ui_elements": [
                {"type": "slider", "options": ["1", "2"]},
                {"type": "radio", "options": ["Yes"]}
            ]
        });
        let reply = PromptReply::from_raw(&raw);
        assert_eq!(reply.ui_elements.len(), 1);
        assert_eq!(reply.ui_elements[0].kind, UiElementKind::Radio);
    }

    #[test]
    fn options_are_trimmed_and_stringified() {
        let raw = json!({
            "ui_elements": [{"type": "radio", "options": ["  Padded  ", 7]}]
        });
        let reply = PromptReply::from_raw(&raw);
        assert_eq!(reply.ui_elements[0].options, vec!["( ) Padded", "( ) 7"]);
    }

    #[test]
    fn serializes_with_lowercase_tags() {
        let reply = PromptReply::from_raw(&json!({"status": "delivered"}));
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["status"], "delivered");
    }
}
