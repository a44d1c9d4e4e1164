use serde::{Deserialize, Serialize};

/// Error body the backend attaches to non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: Some(false),
            error: Some(message.into()),
        }
    }
}

/// Best-effort detail for a failed response: the JSON `error` field when
/// present, otherwise the raw body text. Blank bodies yield `None`.
pub fn extract_error_detail(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = parsed.error.filter(|message| !message.trim().is_empty()) {
            return Some(message);
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}
