use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ─── Request types ────────────────────────────────────────────────────────────

pub const DEFAULT_TYPE: &str = "community";
pub const DEFAULT_TONE: &str = "neutral";
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Options for a single rewrite, decoded from the request body.
///
/// Every field is optional on the wire. Absent keys take their default;
/// present keys are never rejected for their JSON type (see [`passthrough`]).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RewriteRequest {
    #[serde(default, deserialize_with = "passthrough")]
    pub text: String,
    #[serde(rename = "type", default = "default_type", deserialize_with = "passthrough")]
    pub kind: String,
    #[serde(default = "default_tone", deserialize_with = "passthrough")]
    pub tone: String,
    #[serde(default = "default_language", deserialize_with = "passthrough")]
    pub language: String,
}

impl Default for RewriteRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            kind: default_type(),
            tone: default_tone(),
            language: default_language(),
        }
    }
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

fn default_tone() -> String {
    DEFAULT_TONE.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Strings are taken verbatim; any other JSON value becomes its compact JSON text.
fn passthrough<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RewriteResponse {
    pub result: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
