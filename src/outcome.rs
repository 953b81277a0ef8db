use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

pub const MISSING_DATA: &str = "MISSING_DATA";
pub const HMAC_ERROR: &str = "HMAC_ERROR";
pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
pub const UNEXPECTED_ERROR: &str = "UNEXPECTED_ERROR";

/// Result of one gateway operation.
///
/// Serializes to the two envelope shapes every caller depends on:
/// `{"data": {...}}` or `{"error": {"code": ..., "text": ...}}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Map<String, Value>),
    Error { code: String, text: String },
}

impl Outcome {
    pub fn success(payload: Map<String, Value>) -> Self {
        Outcome::Success(payload)
    }

    pub fn error(code: impl Into<String>, text: impl Into<String>) -> Self {
        Outcome::Error {
            code: code.into(),
            text: text.into(),
        }
    }

    pub fn missing_data() -> Self {
        Self::error(MISSING_DATA, "Some request data missing")
    }

    pub fn hmac_error() -> Self {
        Self::error(HMAC_ERROR, "Incorrect HMAC sign or timestamp")
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error { .. })
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            Outcome::Error { code, .. } => Some(code),
            Outcome::Success(_) => None,
        }
    }
}

/// Builds a success payload from a `json!({...})` object literal.
/// Anything other than an object ends up under a `value` key.
impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Outcome::Success(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Outcome::Success(map)
            }
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum Wire<'a> {
    Data(&'a Map<String, Value>),
    Error { code: &'a str, text: &'a str },
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Outcome::Success(payload) => Wire::Data(payload),
            Outcome::Error { code, text } => Wire::Error { code, text },
        };
        wire.serialize(serializer)
    }
}
