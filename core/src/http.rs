//! Request and response types exchanged with the transport.
//!
//! # Design
//! A [`RequestSpec`] describes one call as plain data: method, path (which may
//! carry a raw query string) and an optional serialized body. The transport
//! turns it into a network request and hands back a [`ControllerResponse`].
//!
//! `ControllerResponse` owns the unread response body. Every accessor that
//! reads the body consumes the response, so the body is released exactly once
//! no matter which layer finishes with it.

use std::fmt;
use std::io::Read;

use serde::de::DeserializeOwned;
use ureq::http::HeaderMap;
use ureq::Body;

use crate::error::{ApiError, Result};
use crate::version::ApiMismatch;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One controller call described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    /// Absolute path on the controller, optionally followed by `?query`.
    pub path: String,
    pub body: Option<Vec<u8>>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Attach `payload` serialized as JSON.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, payload: &T) -> Result<Self> {
        let body = serde_json::to_vec(payload).map_err(ApiError::SerializationError)?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn path_and_query(&self) -> (&str, Option<&str>) {
        split_path(&self.path)
    }
}

/// Split `path` at the first `?` into path and raw query.
pub(crate) fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    }
}

/// What to do when a successful response reports an incompatible API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Log a warning and use the response anyway.
    Advisory,
    /// Fail with [`ApiError::ApiMismatch`].
    Fatal,
}

/// A successful (2xx/3xx) controller response with its body still unread.
pub struct ControllerResponse {
    status: u16,
    headers: HeaderMap,
    body: Body,
    mismatch: Option<ApiMismatch>,
}

impl ControllerResponse {
    pub(crate) fn new(
        status: u16,
        headers: HeaderMap,
        body: Body,
        mismatch: Option<ApiMismatch>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            mismatch,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn api_mismatch(&self) -> Option<&ApiMismatch> {
        self.mismatch.as_ref()
    }

    /// Apply `policy` to a carried version mismatch. A fatal mismatch drops
    /// the unread body.
    pub fn checked(self, policy: MismatchPolicy) -> Result<Self> {
        let Some(mismatch) = self.mismatch.clone() else {
            return Ok(self);
        };
        match policy {
            MismatchPolicy::Fatal => Err(ApiError::ApiMismatch(mismatch)),
            MismatchPolicy::Advisory => {
                tracing::warn!(
                    server = %mismatch.server,
                    client = %mismatch.client,
                    "controller API version mismatch, continuing"
                );
                Ok(self)
            }
        }
    }

    /// Stream-decode the body as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_reader(self.body.into_reader()).map_err(ApiError::DeserializationError)
    }

    pub fn text(mut self) -> Result<String> {
        Ok(self.body.read_to_string()?)
    }

    pub fn into_reader(self) -> impl Read {
        self.body.into_reader()
    }

    /// Release the body without reading it.
    pub fn discard(self) {}
}

impl fmt::Debug for ControllerResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("mismatch", &self.mismatch)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_without_query() {
        let spec = RequestSpec::new(HttpMethod::Get, "/v2/apps/");
        assert_eq!(spec.path_and_query(), ("/v2/apps/", None));
    }

    #[test]
    fn query_splits_on_first_question_mark() {
        let spec = RequestSpec::new(HttpMethod::Get, "/v2/apps/?limit=2?x=1");
        assert_eq!(spec.path_and_query(), ("/v2/apps/", Some("limit=2?x=1")));
    }

    #[test]
    fn json_body_is_serialized() {
        let spec = RequestSpec::new(HttpMethod::Post, "/v2/apps/")
            .json(&serde_json::json!({"id": "example"}))
            .unwrap();
        assert_eq!(spec.body.as_deref(), Some(br#"{"id":"example"}"#.as_slice()));
    }

    #[test]
    fn method_names() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
    }
}
