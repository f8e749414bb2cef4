use serde::{Deserialize, Serialize};

use crate::gemini::types::Content;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentPath {
    /// Bare model id, e.g. `gemini-1.5-flash-002` (no `models/` prefix).
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequestBody {
    /// Required. The content of the current conversation with the model.
    pub contents: Vec<Content>,
    /// System instruction (text-only Content). Older model generations reject it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

impl GenerateContentRequestBody {
    /// Single user turn, system prompt sent as a dedicated `systemInstruction`.
    pub fn primary(message: &str, system_prompt: Option<&str>) -> Self {
        Self {
            contents: vec![Content::user_text(message)],
            system_instruction: system_prompt.map(Content::instruction),
        }
    }

    /// System prompt injected as a leading user turn, no `systemInstruction`.
    pub fn fallback(message: &str, system_prompt: &str) -> Self {
        Self {
            contents: vec![Content::user_text(system_prompt), Content::user_text(message)],
            system_instruction: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateContentRequest {
    pub path: GenerateContentPath,
    pub body: GenerateContentRequestBody,
}

#[cfg(test)]
mod tests {
    use super::GenerateContentRequestBody;
    use serde_json::json;

    #[test]
    fn primary_shape_carries_system_instruction_separately() {
        let body = GenerateContentRequestBody::primary("Hello", Some("Be brief"));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }],
                "systemInstruction": { "parts": [{ "text": "Be brief" }] }
            })
        );
    }

    #[test]
    fn primary_shape_without_prompt_omits_field() {
        let body = GenerateContentRequestBody::primary("Hello", None);
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("systemInstruction").is_none());
        assert_eq!(value["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn fallback_shape_leads_with_prompt_turn() {
        let body = GenerateContentRequestBody::fallback("Hello", "Be brief");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "Be brief" }] },
                    { "role": "user", "parts": [{ "text": "Hello" }] }
                ]
            })
        );
    }
}
