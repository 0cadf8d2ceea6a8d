//! The slice of the Canvas REST payloads the engine reads.
//!
//! Everything else in the responses is ignored by serde.

use serde::Deserialize;

/// Entry of `GET /courses/{id}/folders`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiFolder {
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
}

/// Entry of `GET /courses/{id}/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiFile {
    pub folder_id: i64,
    pub display_name: String,
    /// Direct download URL. Empty or missing while the file is still being processed.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl ApiFile {
    pub fn source_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

/// Entry of `GET /courses` and body of `GET /courses/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCourse {
    pub id: i64,
    #[serde(default)]
    pub course_code: Option<String>,
}

/// Extract the message of an `{"errors": [{"message": ...}]}` payload, if the body is one.
pub fn api_error_message(body: &serde_json::Value) -> Option<String> {
    let errors = body.as_object()?.get("errors")?;
    let first = match errors {
        serde_json::Value::Array(list) if !list.is_empty() => &list[0],
        serde_json::Value::Array(_) | serde_json::Value::Null => return None,
        other => other,
    };
    Some(
        first
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error.")
            .to_string(),
    )
}
