//! Translation of transport failures and error responses.

use serde_json::Value;

use crate::Error;

/// Maps a reqwest failure to a structured error.
pub(crate) fn from_reqwest(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timeout()
            .with_message("The request timed out")
            .with_source(err)
    } else if err.is_connect() {
        Error::network_error()
            .with_message("Unable to reach the server")
            .with_source(err)
    } else if err.is_decode() {
        Error::serialization()
            .with_message("Unexpected response from the server")
            .with_source(err)
    } else {
        Error::network_error().with_source(err)
    }
}

/// Builds the error for a non-success response.
pub(crate) fn from_response(status: u16, body: &[u8]) -> Error {
    let error = Error::from_status(status);
    match extract_message(body) {
        Some(message) => error.with_message(message),
        None => error,
    }
}

/// Extracts a human message from an error body.
///
/// Understands `{"detail": "..."}`, the validation shape
/// `{"detail": [{"msg": "..."}, ...]}`, and plain `message` or `error`
/// fields.
pub(crate) fn extract_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    let message = match value.get("detail") {
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
    .or_else(|| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_owned))
    })?;

    let message = message.trim();
    (!message.is_empty()).then(|| message.to_owned())
}
