//! Request options and response-body classification.

use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::form::FormData;

/// Body of an outgoing request.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(serde_json::Value),
    /// Multipart form data (file uploads).
    Multipart(FormData),
}

impl RequestBody {
    /// Whether this body is sent as multipart form data.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// Options for [`ApiClient::request`](crate::ApiClient::request).
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// HTTP method (defaults to GET).
    pub method: Method,
    /// Request body.
    pub body: RequestBody,
    /// Bearer token to attach, if any.
    pub token: Option<SecretString>,
    /// Query string pairs, appended in order.
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    /// A GET request.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// A request with the given method and no body.
    #[must_use]
    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// A DELETE request.
    #[must_use]
    pub fn delete() -> Self {
        Self::method(Method::DELETE)
    }

    /// A request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if `body` cannot be serialized.
    pub fn json(method: Method, body: &impl Serialize) -> Result<Self, ApiError> {
        Ok(Self {
            method,
            body: RequestBody::Json(serde_json::to_value(body)?),
            ..Self::default()
        })
    }

    /// A request with a multipart body.
    #[must_use]
    pub fn multipart(method: Method, form: FormData) -> Self {
        Self {
            method,
            body: RequestBody::Multipart(form),
            ..Self::default()
        }
    }

    /// Attach a bearer token when one is present.
    #[must_use]
    pub fn with_token(mut self, token: Option<&SecretString>) -> Self {
        self.token = token.cloned();
        self
    }

    /// Append a query pair.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query pair when a value is present.
    #[must_use]
    pub fn with_query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }
}

/// A classified response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    /// 204, an empty body, or the response to a DELETE.
    Empty,
    /// Parsed JSON.
    Json(serde_json::Value),
    /// Non-JSON text.
    Text(String),
}

impl ApiBody {
    /// Whether the body is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Deserialize a JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnexpectedBody`] for empty or text bodies and
    /// [`ApiError::Parse`] if the JSON does not match `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Self::Json(value) => Ok(serde_json::from_value(value)?),
            Self::Empty => Err(ApiError::UnexpectedBody("empty body".to_string())),
            Self::Text(text) => Err(ApiError::UnexpectedBody(
                text.chars().take(200).collect(),
            )),
        }
    }
}

/// Classify a successful response body.
///
/// - 204, any DELETE, or a blank body → [`ApiBody::Empty`]
/// - JSON content type → parsed JSON (a parse failure is an error)
/// - anything else → JSON if it happens to parse, otherwise the raw text
pub(crate) fn classify_body(
    method: &Method,
    status: StatusCode,
    content_type: Option<&str>,
    text: String,
) -> Result<ApiBody, ApiError> {
    if status == StatusCode::NO_CONTENT || *method == Method::DELETE || text.trim().is_empty() {
        return Ok(ApiBody::Empty);
    }

    if content_type.is_some_and(is_json_content_type) {
        return Ok(ApiBody::Json(serde_json::from_str(&text)?));
    }

    Ok(serde_json::from_str(&text).map_or(ApiBody::Text(text), ApiBody::Json))
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_content_is_empty() {
        let body = classify_body(&Method::POST, StatusCode::NO_CONTENT, None, String::new());
        assert_eq!(body.unwrap(), ApiBody::Empty);
    }

    #[test]
    fn test_delete_is_empty_even_with_body() {
        let body = classify_body(
            &Method::DELETE,
            StatusCode::OK,
            Some("application/json"),
            r#"{"deleted":true}"#.to_string(),
        );
        assert_eq!(body.unwrap(), ApiBody::Empty);
    }

    #[test]
    fn test_blank_body_is_empty() {
        let body = classify_body(
            &Method::GET,
            StatusCode::OK,
            Some("application/json"),
            "  \n".into(),
        );
        assert_eq!(body.unwrap(), ApiBody::Empty);
    }

    #[test]
    fn test_json_content_type_is_parsed() {
        let body = classify_body(
            &Method::GET,
            StatusCode::OK,
            Some("application/json; charset=utf-8"),
            r#"{"id":1}"#.into(),
        );
        assert_eq!(body.unwrap(), ApiBody::Json(json!({"id": 1})));
    }

    #[test]
    fn test_invalid_json_with_json_content_type_is_error() {
        let body =
            classify_body(&Method::GET, StatusCode::OK, Some("application/json"), "{".into());
        assert!(matches!(body, Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_text_falls_back_to_json_parse() {
        let body = classify_body(&Method::GET, StatusCode::OK, Some("text/html"), "[1,2]".into());
        assert_eq!(body.unwrap(), ApiBody::Json(json!([1, 2])));
    }

    #[test]
    fn test_plain_text_is_kept() {
        let body = classify_body(&Method::GET, StatusCode::OK, None, "pong".into());
        assert_eq!(body.unwrap(), ApiBody::Text("pong".into()));
    }

    #[test]
    fn test_problem_json_counts_as_json() {
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/plain"));
    }

    #[test]
    fn test_into_json_rejects_text() {
        let err = ApiBody::Text("oops".into()).into_json::<serde_json::Value>();
        assert!(matches!(err, Err(ApiError::UnexpectedBody(_))));
    }

    #[test]
    fn test_options_builders() {
        let options = RequestOptions::get()
            .with_query("search", "vanne")
            .with_query_opt("page", None::<u32>)
            .with_query_opt("category", Some(3));
        assert_eq!(options.method, Method::GET);
        assert_eq!(
            options.query,
            vec![
                ("search".to_string(), "vanne".to_string()),
                ("category".to_string(), "3".to_string()),
            ]
        );
        assert!(options.token.is_none());
    }
}
