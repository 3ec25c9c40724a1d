//! Error types for the controller client.
//!
//! # Design
//! Controller-reported failures arrive as [`ApiError::Controller`] carrying a
//! [`ClassifiedError`]. A protocol version mismatch detected on the same
//! response rides along in `mismatch` instead of replacing the classified
//! error, so callers see both. Transport failures are passed through
//! unclassified.

use thiserror::Error;

use crate::classify::{ClassifiedError, ErrorKind};
use crate::version::ApiMismatch;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Errors returned by [`Client`](crate::Client) and the resource handles.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response, or its body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// The controller answered with an error status.
    #[error("{error}")]
    Controller {
        error: ClassifiedError,
        mismatch: Option<ApiMismatch>,
    },

    /// The controller speaks an incompatible protocol version.
    #[error(transparent)]
    ApiMismatch(#[from] ApiMismatch),

    /// The probe endpoint did not answer like a controller.
    #[error(
        "{url} does not appear to be a valid controller. Make sure that the controller URL is \
         correct, the server is running and your client version is correct."
    )]
    InvalidController {
        url: String,
        #[source]
        source: Option<ureq::Error>,
    },

    #[error("invalid controller URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[source] serde_json::Error),

    /// The application has not written any logs yet.
    #[error("there are currently no log messages for this application")]
    NoLogs,
}

impl ApiError {
    /// Kind of the controller-reported error, if this is one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Controller { error, .. } => Some(error.kind()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }

    /// The version mismatch carried by this error, either as the error itself
    /// or as an overlay on a classified controller error.
    pub fn api_mismatch(&self) -> Option<&ApiMismatch> {
        match self {
            ApiError::ApiMismatch(mismatch) => Some(mismatch),
            ApiError::Controller { mismatch, .. } => mismatch.as_ref(),
            _ => None,
        }
    }

    pub fn is_api_mismatch(&self) -> bool {
        matches!(self, ApiError::ApiMismatch(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch() -> ApiMismatch {
        ApiMismatch {
            server: "3.0".to_string(),
            client: "2.2".to_string(),
        }
    }

    #[test]
    fn controller_error_displays_classified_message() {
        let err = ApiError::Controller {
            error: ClassifiedError::new(ErrorKind::NotFound, 404, None),
            mismatch: None,
        };
        assert_eq!(err.to_string(), "Not Found");
        assert!(err.is_not_found());
        assert!(err.api_mismatch().is_none());
    }

    #[test]
    fn mismatch_overlay_is_visible_on_controller_errors() {
        let err = ApiError::Controller {
            error: ClassifiedError::new(ErrorKind::Forbidden, 403, None),
            mismatch: Some(mismatch()),
        };
        assert_eq!(err.kind(), Some(ErrorKind::Forbidden));
        assert_eq!(err.api_mismatch(), Some(&mismatch()));
        assert!(!err.is_api_mismatch());
    }

    #[test]
    fn bare_mismatch_is_an_api_mismatch() {
        let err = ApiError::from(mismatch());
        assert!(err.is_api_mismatch());
        assert_eq!(err.kind(), None);
    }
}
