//! Shared response handling for the backend clients

use cropai_common::{Error, Result};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keys the backend uses for human-readable error text, in lookup order
const MESSAGE_KEYS: [&str; 5] = ["msg", "error_description", "message", "error", "hint"];

/// Pull a readable message out of an error body
///
/// Falls back to the raw body, then to the status reason.
pub fn extract_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in MESSAGE_KEYS {
            if let Some(text) = json.get(key).and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

/// Turn a non-success response into `Error::Service`
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Service {
        status: status.as_u16(),
        message: extract_error_message(status, &body),
    })
}

/// Check status, then decode the JSON body
///
/// Decoding goes through text so a malformed body surfaces as `Error::Decode`
/// rather than a transport error.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_message_from_gotrue_body() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            extract_error_message(StatusCode::BAD_REQUEST, body),
            "Invalid login credentials"
        );
    }

    #[test]
    fn test_message_from_postgrest_body() {
        let body = r#"{"code":"42501","message":"new row violates row-level security policy"}"#;
        assert_eq!(
            extract_error_message(StatusCode::FORBIDDEN, body),
            "new row violates row-level security policy"
        );
    }

    #[test]
    fn test_message_falls_back_to_body_then_reason() {
        assert_eq!(
            extract_error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(
            extract_error_message(StatusCode::BAD_GATEWAY, ""),
            "Bad Gateway"
        );
    }
}
