//! Single-page list requests.
//!
//! List endpoints wrap their records in `{count, next, previous, results}`.
//! Only the first page is fetched: callers wanting more records ask for a
//! larger page size. The cursor links are ignored.

use std::io::Read;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::client::Client;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, MismatchPolicy};
use crate::version::ApiMismatch;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The `results` array re-serialized as JSON, in server order.
    pub results: String,
    /// Total number of records on the server, across all pages.
    pub count: u64,
    pub mismatch: Option<ApiMismatch>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    count: u64,
    results: Vec<Value>,
}

impl Client {
    /// GET `path?limit=<page_size>` and unwrap the list envelope.
    pub fn limited_request(&self, path: &str, page_size: usize) -> Result<Page> {
        let response = self.request(HttpMethod::Get, &format!("{path}?limit={page_size}"), None)?;
        let mismatch = response.api_mismatch().cloned();
        let (results, count) = decode_envelope(response.into_reader())?;
        Ok(Page {
            results,
            count,
            mismatch,
        })
    }

    /// Fetch one page of `path` and decode its records as `T`.
    pub fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        page_size: usize,
        policy: MismatchPolicy,
    ) -> Result<(Vec<T>, u64)> {
        let response = self
            .request(HttpMethod::Get, &format!("{path}?limit={page_size}"), None)?
            .checked(policy)?;
        let envelope: Envelope = response.json()?;
        let records = envelope
            .results
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()
            .map_err(ApiError::DeserializationError)?;
        Ok((records, envelope.count))
    }
}

/// Decode a list envelope, returning the re-serialized `results` and `count`.
pub fn decode_envelope<R: Read>(reader: R) -> Result<(String, u64)> {
    let envelope: Envelope =
        serde_json::from_reader(reader).map_err(ApiError::DeserializationError)?;

    if (envelope.results.len() as u64) > envelope.count {
        tracing::debug!(
            count = envelope.count,
            returned = envelope.results.len(),
            "list page holds more records than the reported count"
        );
    }

    let results = serde_json::to_string(&envelope.results).map_err(ApiError::SerializationError)?;
    Ok((results, envelope.count))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITED_FIXTURE: &str = r#"
{
    "count": 4,
    "next": "http://replaced.com/limited2/",
    "previous": null,
    "results": [
        {
            "test": "foo"
        },
        {
            "test": "bar"
        }
    ]
}
"#;

    #[test]
    fn envelope_is_unwrapped_to_results_and_count() {
        let (results, count) = decode_envelope(LIMITED_FIXTURE.as_bytes()).unwrap();
        assert_eq!(count, 4);
        assert_eq!(results, r#"[{"test":"foo"},{"test":"bar"}]"#);
    }

    #[test]
    fn missing_count_is_a_decode_error() {
        let err = decode_envelope(r#"{"results":[]}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn non_array_results_is_a_decode_error() {
        let err = decode_envelope(r#"{"count":1,"results":{"id":"a"}}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn non_numeric_count_is_a_decode_error() {
        let err = decode_envelope(r#"{"count":"4","results":[]}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn record_order_is_preserved() {
        let (results, _) =
            decode_envelope(r#"{"count":3,"results":[3,1,2]}"#.as_bytes()).unwrap();
        assert_eq!(results, "[3,1,2]");
    }
}
