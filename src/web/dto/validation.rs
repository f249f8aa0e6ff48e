//! Validation utilities for bridge API DTOs.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// The body is read as bytes and parsed with `serde_json`, so every failure
/// becomes a plain-text 400 instead of axum's JSON rejection. A request with
/// a content type other than JSON is refused; a missing one is accepted.
///
/// # Example
///
/// ```ignore
/// use xivchat_bridge::web::dto::{NewMessageBody, ValidatedJson};
///
/// async fn create_message(
///     ValidatedJson(body): ValidatedJson<NewMessageBody>,
/// ) -> Result<StatusCode, ApiError> {
///     // body is already validated
///     // ...
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

/// Whether the request declares a JSON body, or declares nothing.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return true;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or("").trim();
    essence.eq_ignore_ascii_case("application/json")
        || (essence.len() > 5
            && essence.starts_with("application/")
            && essence.to_ascii_lowercase().ends_with("+json"))
}

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !accepts_json(req.headers()) {
            return Err(ApiError::bad_request(
                "Unable to parse message: expected an application/json body",
            ));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Unable to parse message: {}", e)))?;

        let value: T = serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!("rejected message body: {}", e);
            ApiError::bad_request(format!("Unable to parse message: {}", e))
        })?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

// ============================================================================
// Custom Validators
// ============================================================================

/// Validate that a string contains no NUL bytes.
pub fn no_nul_bytes(value: &str) -> Result<(), validator::ValidationError> {
    if value.contains('\0') {
        return Err(validator::ValidationError::new("no_nul_bytes")
            .with_message("must not contain NUL bytes".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn test_no_nul_bytes() {
        assert!(no_nul_bytes("Hello, world!").is_ok());
        assert!(no_nul_bytes("Line 1\nLine 2").is_ok());
        assert!(no_nul_bytes("Hello\x00World").is_err());
    }

    #[test]
    fn test_accepts_json() {
        assert!(accepts_json(&HeaderMap::new()));
        assert!(accepts_json(&headers_with("application/json")));
        assert!(accepts_json(&headers_with("application/json; charset=utf-8")));
        assert!(accepts_json(&headers_with("Application/JSON")));
        assert!(accepts_json(&headers_with("application/merge-patch+json")));
    }

    #[test]
    fn test_rejects_other_content_types() {
        assert!(!accepts_json(&headers_with("text/plain")));
        assert!(!accepts_json(&headers_with(
            "application/x-www-form-urlencoded"
        )));
        assert!(!accepts_json(&headers_with("multipart/form-data; boundary=x")));
    }
}
