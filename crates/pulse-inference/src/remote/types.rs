//! Wire types for the chat-completions protocol.

use serde::{Deserialize, Serialize};

/// Request to the chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

/// Response from chat completions endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
}

/// Single chat completion choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: usize,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

/// Error response body.
#[derive(Debug, Deserialize)]
pub struct RemoteErrorResponse {
    pub error: RemoteError,
}

/// Detailed error information.
#[derive(Debug, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RemoteError {
    /// Most specific error class string available.
    pub fn class(&self) -> &str {
        self.error_type
            .as_deref()
            .or(self.status.as_deref())
            .unwrap_or("unknown")
    }
}

/// Parse an error body, tolerating the list-wrapped form some providers use.
pub fn parse_error_body(body: &str) -> Option<RemoteError> {
    if let Ok(resp) = serde_json::from_str::<RemoteErrorResponse>(body) {
        return Some(resp.error);
    }
    serde_json::from_str::<Vec<RemoteErrorResponse>>(body)
        .ok()
        .and_then(|list| list.into_iter().next())
        .map(|resp| resp.error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_none() {
        let request = ChatCompletionRequest {
            model: "gemini-2.0-flash-lite".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: Some(0.1),
            max_tokens: None,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "[]"}, "finish_reason": "stop"}]
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("[]"));
        assert!(response.id.is_none());
    }

    #[test]
    fn test_parse_error_body_plain() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "invalid_request_error"}}"#;
        let err = parse_error_body(body).unwrap();
        assert_eq!(err.message, "Invalid API key");
        assert_eq!(err.class(), "invalid_request_error");
    }

    #[test]
    fn test_parse_error_body_list_wrapped() {
        let body = r#"[{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}]"#;
        let err = parse_error_body(body).unwrap();
        assert_eq!(err.class(), "RESOURCE_EXHAUSTED");
    }

    #[test]
    fn test_parse_error_body_garbage() {
        assert!(parse_error_body("<html>bad gateway</html>").is_none());
    }
}
