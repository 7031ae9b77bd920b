//! Payload decoders turning a response body into untyped record values.
//!
//! Decoders only split the payload into records. Conversion into the caller's
//! result type happens in the executor, which knows the projection.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::{QueryError, Result};

/// Splits a response body into one JSON value per record.
pub trait Decode: Send + Sync + fmt::Debug {
    /// Decodes `body` into record values.
    fn decode_rows(&self, body: &[u8]) -> Result<Vec<JsonValue>>;
}

/// Body is a single JSON array of records.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonArray;

impl Decode for JsonArray {
    fn decode_rows(&self, body: &[u8]) -> Result<Vec<JsonValue>> {
        let value: JsonValue = serde_json::from_slice(body)
            .map_err(|err| QueryError::decode_failed("JSON array", format!("malformed JSON ({err})")))?;
        match value {
            JsonValue::Array(rows) => Ok(rows),
            other => Err(QueryError::decode_failed("JSON array", describe(&other))),
        }
    }
}

/// Body holds one JSON record per line; blank lines are skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonLines;

impl Decode for JsonLines {
    fn decode_rows(&self, body: &[u8]) -> Result<Vec<JsonValue>> {
        let mut rows = Vec::new();
        for (index, line) in body.split(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let value = serde_json::from_slice(line).map_err(|err| {
                QueryError::decode_failed(
                    "JSON value per line",
                    format!("malformed JSON on line {} ({err})", index + 1),
                )
            })?;
            rows.push(value);
        }
        Ok(rows)
    }
}

/// Describes the top-level shape of a JSON value for error messages.
pub fn describe(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "JSON null",
        JsonValue::Bool(_) => "JSON boolean",
        JsonValue::Number(_) => "JSON number",
        JsonValue::String(_) => "JSON string",
        JsonValue::Array(_) => "JSON array",
        JsonValue::Object(_) => "JSON object",
    }
}
