//! Response validator: enforces the shape of a fetched poll body.

use serde_json::Value;

use herald_common::error::PollError;
use herald_common::types::PollResponse;

const HOMEWORKS_KEY: &str = "homeworks";
const CURRENT_DATE_KEY: &str = "current_date";

/// Validate a parsed body and extract its submissions.
///
/// The body must be a mapping with a list under `homeworks`. An empty list is
/// valid, and the entries themselves are left to the verdict mapper. A
/// `current_date` that is not an integer is ignored rather than rejected, so a
/// bad server clock never blocks delivery.
pub fn check_response(body: &Value) -> Result<PollResponse, PollError> {
    let map = body.as_object().ok_or_else(|| {
        PollError::MalformedResponse(format!("expected a mapping, got {}", shape(body)))
    })?;

    let list = match map.get(HOMEWORKS_KEY) {
        Some(Value::Array(list)) => list,
        Some(other) => {
            return Err(PollError::MalformedResponse(format!(
                "\"{HOMEWORKS_KEY}\" must be a list, got {}",
                shape(other)
            )));
        }
        None => {
            return Err(PollError::MalformedResponse(format!(
                "missing \"{HOMEWORKS_KEY}\" field"
            )));
        }
    };

    let current_date = match map.get(CURRENT_DATE_KEY) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let parsed = value.as_i64();
            if parsed.is_none() {
                tracing::warn!(value = %value, "Ignoring non-integer current_date");
            }
            parsed
        }
    };

    Ok(PollResponse {
        homeworks: list.clone(),
        current_date,
    })
}

/// Human-readable JSON type name for error messages.
fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
