//! Responses produced by resolvers.
//!
//! A [`Response`] can only be obtained from [`ResponseBuilder::build`], which
//! rejects combinations no client could make sense of.

use axum::body::Body;
use axum::http::header::{ACCEPT_RANGES, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;
use thiserror::Error;

use crate::mime;

#[derive(Debug, Error, PartialEq)]
#[error("invalid response: {0}")]
pub struct InvalidResponseError(String);

impl InvalidResponseError {
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Text encodings [`ResponseBuilder::set_content_str`] can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    UsAscii,
}

impl Charset {
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
        }
    }

    fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::UsAscii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    content: Vec<u8>,
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.headers, Body::from(self.content)).into_response()
    }
}

/// Builder for [`Response`]. The status defaults to 200.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: u16,
    headers: HeaderMap,
    content: Option<Vec<u8>>,
    invalid_header: Option<String>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            content: None,
            invalid_header: None,
        }
    }

    pub fn set_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn set_mime_type(self, mime_type: impl AsRef<str>) -> Self {
        self.set_header(CONTENT_TYPE, mime_type)
    }

    /// Set a header, replacing any previous value. A value that is not valid
    /// in HTTP makes [`build`](Self::build) fail.
    pub fn set_header(mut self, name: HeaderName, value: impl AsRef<str>) -> Self {
        match HeaderValue::from_str(value.as_ref()) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(_) => self.invalid_header = Some(name.to_string()),
        }
        self
    }

    pub fn remove_header(mut self, name: HeaderName) -> Self {
        self.headers.remove(name);
        self
    }

    /// Raw content. Advertises byte-range support.
    pub fn set_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self.set_header(ACCEPT_RANGES, "bytes")
    }

    /// Text content in `charset`. A MIME type that is already set and names
    /// no charset gets `; charset=<charset>` appended.
    pub fn set_content_str(mut self, content: &str, charset: Charset) -> Self {
        self.content = Some(charset.encode(content));
        let with_charset = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|mime_type| !mime_type.to_ascii_lowercase().contains("charset"))
            .map(|mime_type| format!("{mime_type}; charset={}", charset.name().to_lowercase()));
        if let Some(mime_type) = with_charset {
            self = self.set_mime_type(mime_type);
        }
        self.remove_header(ACCEPT_RANGES)
    }

    /// JSON content, UTF-8 encoded.
    pub fn set_json_content<T: Serialize + ?Sized>(self, value: &T) -> serde_json::Result<Self> {
        let json = serde_json::to_string(value)?;
        Ok(self.set_mime_type(mime::JSON).set_content_str(&json, Charset::Utf8))
    }

    /// Temporary redirect without a body.
    pub fn redirect_to(self, location: impl AsRef<str>) -> Self {
        self.set_status(302)
            .set_header(LOCATION, location)
            .set_content(Vec::new())
            .remove_header(ACCEPT_RANGES)
    }

    pub fn build(self) -> Result<Response, InvalidResponseError> {
        if !(100..=599).contains(&self.status) {
            return Err(InvalidResponseError(format!(
                "status code {} is outside 100-599",
                self.status
            )));
        }
        let status = StatusCode::from_u16(self.status)
            .map_err(|_| InvalidResponseError(format!("status code {} is not valid", self.status)))?;

        if let Some(name) = self.invalid_header {
            return Err(InvalidResponseError(format!("header {name} has a value that is not valid HTTP")));
        }

        let mime_type = self.headers.get(CONTENT_TYPE);
        if mime_type.is_some_and(HeaderValue::is_empty) {
            return Err(InvalidResponseError("MIME type was set to an empty string".to_string()));
        }

        let content = match self.content {
            Some(content) => content,
            None if status == StatusCode::NO_CONTENT => Vec::new(),
            None => {
                return Err(InvalidResponseError(format!(
                    "content was not set for status {}",
                    self.status
                )));
            }
        };
        if !content.is_empty() && mime_type.is_none() {
            return Err(InvalidResponseError(
                "content was set but no MIME type was given".to_string(),
            ));
        }

        Ok(Response {
            status,
            headers: self.headers,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_content_status_needs_no_content() {
        let response = ResponseBuilder::new().set_status(204).build().unwrap();

        assert_eq!(response.status(), 204);
        assert!(response.content().is_empty());
    }

    #[test]
    fn test_missing_content_is_rejected() {
        let result = ResponseBuilder::new().set_status(200).build();

        assert!(result.is_err());
    }

    #[test]
    fn test_empty_content_needs_no_mime_type() {
        let response = ResponseBuilder::new().set_content(Vec::new()).build().unwrap();

        assert_eq!(response.status(), 200);
        assert!(response.mime_type().is_none());
    }

    #[test]
    fn test_content_without_mime_type_is_rejected() {
        let result = ResponseBuilder::new().set_content("hello").build();

        assert!(result.unwrap_err().message().contains("MIME"));
    }

    #[test]
    fn test_empty_mime_type_is_rejected() {
        let result = ResponseBuilder::new()
            .set_mime_type("")
            .set_content(Vec::new())
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_status_out_of_range_is_rejected() {
        let result = ResponseBuilder::new()
            .set_status(999)
            .set_mime_type(mime::PLAIN)
            .set_content("x")
            .build();

        assert!(result.unwrap_err().message().contains("999"));
    }

    #[test]
    fn test_text_content_rewrites_charset() {
        let response = ResponseBuilder::new()
            .set_mime_type(mime::HTML)
            .set_content_str("<p>hi</p>", Charset::Utf8)
            .build()
            .unwrap();

        assert_eq!(response.mime_type(), Some("text/html; charset=utf-8"));
        assert!(response.header("Accept-Ranges").is_none());
    }

    #[test]
    fn test_text_content_replaces_byte_ranges() {
        let response = ResponseBuilder::new()
            .set_mime_type(mime::PLAIN)
            .set_content("bytes")
            .set_content_str("naïve", Charset::UsAscii)
            .build()
            .unwrap();

        assert_eq!(response.content(), b"na?ve");
        assert_eq!(response.mime_type(), Some("text/plain; charset=us-ascii"));
        assert!(response.header("accept-ranges").is_none());
    }

    #[test]
    fn test_existing_charset_is_kept() {
        let response = ResponseBuilder::new()
            .set_mime_type("text/css; charset=iso-8859-1")
            .set_content_str("a{}", Charset::Utf8)
            .build()
            .unwrap();

        assert_eq!(response.mime_type(), Some("text/css; charset=iso-8859-1"));
    }

    #[test]
    fn test_redirect() {
        let response = ResponseBuilder::new().redirect_to("/v1/servers").build().unwrap();

        assert_eq!(response.status(), 302);
        assert_eq!(response.header("location"), Some("/v1/servers"));
        assert!(response.content().is_empty());
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let response = ResponseBuilder::new()
            .set_mime_type(mime::PLAIN)
            .set_header(HeaderName::from_static("x-server"), "alpha")
            .set_header(HeaderName::from_static("x-server"), "beta")
            .set_content("ok")
            .build()
            .unwrap();

        assert_eq!(response.header("X-Server"), Some("beta"));
        assert_eq!(response.headers().get_all("x-server").iter().count(), 1);
        assert_eq!(response.header("content-type"), Some(mime::PLAIN));
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        let result = ResponseBuilder::new().redirect_to("/player/\nSteve").build();

        assert!(result.unwrap_err().message().contains("location"));
    }

    #[test]
    fn test_headers_reach_http_response() {
        let response = ResponseBuilder::new().redirect_to("/v1/servers").build().unwrap();

        let http = response.into_response();

        assert_eq!(http.status(), StatusCode::FOUND);
        assert_eq!(http.headers()[LOCATION], "/v1/servers");
        assert!(http.headers().get(ACCEPT_RANGES).is_none());
    }

    #[test]
    fn test_json_content() {
        let response = ResponseBuilder::new()
            .set_json_content(&serde_json::json!({ "ok": true }))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(response.mime_type(), Some("application/json; charset=utf-8"));
        assert_eq!(response.content(), br#"{"ok":true}"#);
    }
}
