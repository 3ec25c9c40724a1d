//! Maps controller error responses onto typed errors.
//!
//! # Design
//! The controller reports failures in three shapes: validation payloads
//! (`{"field": ["message", ...]}` or `{"field": "message"}`), action payloads
//! (`{"detail": "message"}`), and arbitrary non-JSON text from whatever sits in
//! front of it. Only 400 responses are scanned field by field; every other
//! status maps directly to a kind.
//!
//! The 400 matching policy is the ordered [`RULES`] table. Each rule names a
//! field, the messages it recognizes, and whether a message must equal the
//! server text or only appear inside it. The first matching rule wins.

use std::fmt;

use serde_json::{Map, Value};

const FIELD_REQUIRED: &str = "This field is required.";
const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers and @/./+/-/_ characters.";
const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
const FAILED_LOGIN: &str = "Unable to log in with provided credentials.";
const INVALID_APP_NAME: &str = "App name can only contain a-z (lowercase), 0-9 and hyphens";
const DUPLICATE_APP: &str = "App with this id already exists.";
const DUPLICATE_KEY: &str = "Public Key is already in use";
const INVALID_KEY: &str = "Key contains invalid base64 chars";
const INVALID_CERTIFICATE: &str = "Could not load certificate";
const INVALID_NAME: &str = "Can only contain a-z (lowercase), 0-9 and hyphens";
const INVALID_DOMAIN: &str = "Hostname does not look valid.";
const DUPLICATE_DOMAIN: &str = "Domain is already in use by another application";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const POD_NOT_FOUND: &str = "does not exist in application";
const INVALID_VERSION: &str = "cannot be below 0";
const TAG_NOT_FOUND: &str = "No nodes matched the provided labels";
const CANCELLATION_FAILED: &str = "still has applications assigned";

/// Category of a controller-reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidUsername,
    DuplicateUsername,
    MissingPassword,
    LoginFailed,
    InvalidAppName,
    DuplicateApp,
    MissingID,
    MissingKey,
    DuplicateKey,
    InvalidCertificate,
    InvalidName,
    InvalidDomain,
    DuplicateDomain,
    InvalidImage,
    InvalidEmail,
    PodNotFound,
    InvalidVersion,
    TagNotFound,
    CancellationFailed,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    Unprocessable,
    ServerError,
    /// No rule or status mapping applied. The raw body is kept as the detail.
    Unknown,
}

impl ErrorKind {
    /// Stable, user-facing description of the kind.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::InvalidUsername => INVALID_USERNAME,
            ErrorKind::DuplicateUsername => DUPLICATE_USERNAME,
            ErrorKind::MissingPassword => "A Password is required",
            ErrorKind::LoginFailed => FAILED_LOGIN,
            ErrorKind::InvalidAppName => INVALID_APP_NAME,
            ErrorKind::DuplicateApp => DUPLICATE_APP,
            ErrorKind::MissingID => "An id is required",
            ErrorKind::MissingKey => "A key is required",
            ErrorKind::DuplicateKey => "A key with that public key already exists.",
            ErrorKind::InvalidCertificate => INVALID_CERTIFICATE,
            ErrorKind::InvalidName => INVALID_NAME,
            ErrorKind::InvalidDomain => INVALID_DOMAIN,
            ErrorKind::DuplicateDomain => "The domain is already in use by another application.",
            ErrorKind::InvalidImage => "The given image is invalid",
            ErrorKind::InvalidEmail => INVALID_EMAIL,
            ErrorKind::PodNotFound => "Pod not found in application",
            ErrorKind::InvalidVersion => "The given version is invalid",
            ErrorKind::TagNotFound => TAG_NOT_FOUND,
            ErrorKind::CancellationFailed => {
                "The user still owns applications. Delete or transfer ownership first."
            }
            ErrorKind::Unauthorized => "Unauthorized: Missing or Invalid Token",
            ErrorKind::Forbidden => "You do not have permission to perform this action.",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::MethodNotAllowed => "Method Not Allowed",
            ErrorKind::Conflict => "This action could not be completed due to a conflict.",
            ErrorKind::Unprocessable => "Unable to process your request.",
            ErrorKind::ServerError => "Internal Server Error",
            ErrorKind::Unknown => "Unknown Error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// An error response from the controller, labelled with its [`ErrorKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    kind: ErrorKind,
    status: u16,
    detail: Option<String>,
    body: Vec<u8>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, status: u16, detail: Option<String>) -> Self {
        Self {
            kind,
            status,
            detail,
            body: Vec::new(),
        }
    }

    /// An unclassified error keeping `body` verbatim.
    pub fn unknown(status: u16, body: &[u8]) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status,
            detail: Some(String::from_utf8_lossy(body).into_owned()),
            body: body.to_vec(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Server-supplied text: the matched message, the `detail` field, or the
    /// raw body for [`ErrorKind::Unknown`]. Bytes that are not valid UTF-8
    /// show up as U+FFFD here; [`raw_body`](Self::raw_body) has them as sent.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// The unmodified response body of an [`ErrorKind::Unknown`] error.
    /// Empty for every other kind.
    pub fn raw_body(&self) -> &[u8] {
        &self.body
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Unknown => write!(
                f,
                "Unknown Error ({}): {}",
                self.status,
                self.detail.as_deref().unwrap_or_default()
            ),
            kind => f.write_str(kind.message()),
        }
    }
}

impl std::error::Error for ClassifiedError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
    Exact,
    Substring,
}

/// One entry of the 400 matching policy.
struct Rule {
    field: &'static str,
    messages: &'static [&'static str],
    matching: Match,
    kind: ErrorKind,
}

impl Rule {
    /// Returns the server message that satisfied the rule.
    fn apply<'a>(&self, body: &'a Map<String, Value>) -> Option<&'a str> {
        field_messages(body, self.field).into_iter().find(|server| {
            self.messages.iter().any(|known| match self.matching {
                Match::Exact => server == known,
                Match::Substring => server.contains(known),
            })
        })
    }
}

const RULES: &[Rule] = &[
    Rule {
        field: "username",
        messages: &[FIELD_REQUIRED, INVALID_USERNAME],
        matching: Match::Exact,
        kind: ErrorKind::InvalidUsername,
    },
    Rule {
        field: "username",
        messages: &[DUPLICATE_USERNAME],
        matching: Match::Exact,
        kind: ErrorKind::DuplicateUsername,
    },
    Rule {
        field: "password",
        messages: &[FIELD_REQUIRED],
        matching: Match::Exact,
        kind: ErrorKind::MissingPassword,
    },
    Rule {
        field: "non_field_errors",
        messages: &[FAILED_LOGIN],
        matching: Match::Exact,
        kind: ErrorKind::LoginFailed,
    },
    Rule {
        field: "id",
        messages: &[INVALID_APP_NAME],
        matching: Match::Exact,
        kind: ErrorKind::InvalidAppName,
    },
    Rule {
        field: "id",
        messages: &[DUPLICATE_APP],
        matching: Match::Exact,
        kind: ErrorKind::DuplicateApp,
    },
    Rule {
        field: "id",
        messages: &[FIELD_REQUIRED],
        matching: Match::Exact,
        kind: ErrorKind::MissingID,
    },
    Rule {
        field: "key",
        messages: &[FIELD_REQUIRED],
        matching: Match::Exact,
        kind: ErrorKind::MissingKey,
    },
    Rule {
        field: "key",
        messages: &[DUPLICATE_KEY],
        matching: Match::Exact,
        kind: ErrorKind::DuplicateKey,
    },
    Rule {
        field: "public",
        messages: &[FIELD_REQUIRED, INVALID_KEY],
        matching: Match::Exact,
        kind: ErrorKind::MissingKey,
    },
    Rule {
        field: "certificate",
        messages: &[FIELD_REQUIRED, INVALID_CERTIFICATE],
        matching: Match::Substring,
        kind: ErrorKind::InvalidCertificate,
    },
    Rule {
        field: "name",
        messages: &[FIELD_REQUIRED, INVALID_NAME],
        matching: Match::Exact,
        kind: ErrorKind::InvalidName,
    },
    Rule {
        field: "domain",
        messages: &[INVALID_DOMAIN],
        matching: Match::Exact,
        kind: ErrorKind::InvalidDomain,
    },
    Rule {
        field: "domain",
        messages: &[DUPLICATE_DOMAIN],
        matching: Match::Exact,
        kind: ErrorKind::DuplicateDomain,
    },
    Rule {
        field: "image",
        messages: &[FIELD_REQUIRED],
        matching: Match::Exact,
        kind: ErrorKind::InvalidImage,
    },
    Rule {
        field: "email",
        messages: &[INVALID_EMAIL],
        matching: Match::Exact,
        kind: ErrorKind::InvalidEmail,
    },
    Rule {
        field: "detail",
        messages: &[POD_NOT_FOUND],
        matching: Match::Substring,
        kind: ErrorKind::PodNotFound,
    },
    Rule {
        field: "detail",
        messages: &[INVALID_VERSION],
        matching: Match::Substring,
        kind: ErrorKind::InvalidVersion,
    },
    Rule {
        field: "detail",
        messages: &[TAG_NOT_FOUND],
        matching: Match::Substring,
        kind: ErrorKind::TagNotFound,
    },
];

/// Classify a controller response. Returns `None` for statuses in `[200, 400)`.
pub fn classify(status: u16, body: &[u8]) -> Option<ClassifiedError> {
    if (200..400).contains(&status) {
        return None;
    }

    let kind = match status {
        400 => return Some(classify_bad_request(body)),
        401 => ErrorKind::Unauthorized,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        405 => ErrorKind::MethodNotAllowed,
        409 => classify_conflict(body),
        422 => ErrorKind::Unprocessable,
        500 => ErrorKind::ServerError,
        _ => return Some(ClassifiedError::unknown(status, body)),
    };

    Some(ClassifiedError::new(kind, status, detail_text(body)))
}

fn classify_bad_request(body: &[u8]) -> ClassifiedError {
    let Some(fields) = parse_object(body) else {
        return ClassifiedError::unknown(400, body);
    };

    RULES
        .iter()
        .find_map(|rule| {
            rule.apply(&fields)
                .map(|matched| ClassifiedError::new(rule.kind, 400, Some(matched.to_string())))
        })
        .unwrap_or_else(|| ClassifiedError::unknown(400, body))
}

fn classify_conflict(body: &[u8]) -> ErrorKind {
    match detail_text(body) {
        Some(detail) if detail.contains(CANCELLATION_FAILED) => ErrorKind::CancellationFailed,
        _ => ErrorKind::Conflict,
    }
}

fn parse_object(body: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Some(fields),
        _ => None,
    }
}

fn detail_text(body: &[u8]) -> Option<String> {
    parse_object(body)?
        .get("detail")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// String messages stored under `field`, whether as a single string or a list.
fn field_messages<'a>(body: &'a Map<String, Value>, field: &str) -> Vec<&'a str> {
    match body.get(field) {
        Some(Value::String(message)) => vec![message.as_str()],
        Some(Value::Array(messages)) => messages.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(status: u16, body: &str) -> ErrorKind {
        classify(status, body.as_bytes())
            .expect("expected an error")
            .kind()
    }

    #[test]
    fn success_and_redirect_statuses_are_not_errors() {
        assert!(classify(200, b"").is_none());
        assert!(classify(201, b"{\"username\":[\"This field is required.\"]}").is_none());
        assert!(classify(204, b"").is_none());
        assert!(classify(399, b"garbage").is_none());
    }

    #[test]
    fn required_username_is_invalid_username() {
        assert_eq!(
            kind_of(400, r#"{"username":["This field is required."]}"#),
            ErrorKind::InvalidUsername
        );
    }

    #[test]
    fn duplicate_app_keeps_the_server_message() {
        let err = classify(400, br#"{"id":["App with this id already exists."]}"#).unwrap();
        assert_eq!(err.kind(), ErrorKind::DuplicateApp);
        assert_eq!(err.status(), 400);
        assert_eq!(err.detail(), Some("App with this id already exists."));
    }

    #[test]
    fn first_matching_rule_wins() {
        let body = r#"{"id":["App name can only contain a-z (lowercase), 0-9 and hyphens","Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens."]}"#;
        assert_eq!(kind_of(400, body), ErrorKind::InvalidAppName);
    }

    #[test]
    fn single_string_fields_are_scanned() {
        assert_eq!(
            kind_of(400, r#"{"email":"Enter a valid email address."}"#),
            ErrorKind::InvalidEmail
        );
    }

    #[test]
    fn certificate_messages_match_as_substrings() {
        let body = r#"{"certificate":["Could not load certificate: [('PEM routines', 'PEM_read_bio', 'no start line')]"]}"#;
        assert_eq!(kind_of(400, body), ErrorKind::InvalidCertificate);
    }

    #[test]
    fn exact_fields_reject_partial_messages() {
        let body = r#"{"username":["This field is required. Really."]}"#;
        assert_eq!(kind_of(400, body), ErrorKind::Unknown);
    }

    #[test]
    fn detail_payloads_are_matched_by_substring() {
        assert_eq!(
            kind_of(400, r#"{"detail":"Container type foo does not exist in application"}"#),
            ErrorKind::PodNotFound
        );
        assert_eq!(
            kind_of(400, r#"{"detail":"version cannot be below 0"}"#),
            ErrorKind::InvalidVersion
        );
        assert_eq!(
            kind_of(400, r#"{"detail":"No nodes matched the provided labels: foo=bar"}"#),
            ErrorKind::TagNotFound
        );
    }

    #[test]
    fn non_json_bad_request_keeps_body_verbatim() {
        let html = "<html><body><h1>502 Bad Gateway</h1></body></html>";
        let err = classify(400, html.as_bytes()).unwrap();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.to_string().contains(html));
    }

    #[test]
    fn non_object_json_is_unknown() {
        assert_eq!(kind_of(400, r#"["This field is required."]"#), ErrorKind::Unknown);
    }

    #[test]
    fn unmatched_bad_request_renders_status_and_body() {
        let err = classify(400, br#"{"detail":"unknown error"}"#).unwrap();
        assert_eq!(err.to_string(), r#"Unknown Error (400): {"detail":"unknown error"}"#);
    }

    #[test]
    fn status_codes_map_directly() {
        assert_eq!(kind_of(401, ""), ErrorKind::Unauthorized);
        assert_eq!(kind_of(403, ""), ErrorKind::Forbidden);
        assert_eq!(kind_of(404, ""), ErrorKind::NotFound);
        assert_eq!(kind_of(405, ""), ErrorKind::MethodNotAllowed);
        assert_eq!(kind_of(409, ""), ErrorKind::Conflict);
        assert_eq!(kind_of(422, ""), ErrorKind::Unprocessable);
        assert_eq!(kind_of(500, ""), ErrorKind::ServerError);
    }

    #[test]
    fn status_mapping_ignores_validation_fields() {
        assert_eq!(
            kind_of(404, r#"{"username":["This field is required."]}"#),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn conflict_with_owned_apps_is_cancellation_failure() {
        let body = r#"{"detail":"foo still has applications assigned. Delete or transfer ownership"}"#;
        assert_eq!(kind_of(409, body), ErrorKind::CancellationFailed);
    }

    #[test]
    fn other_statuses_are_unknown() {
        let err = classify(502, b"Bad Gateway").unwrap();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.to_string(), "Unknown Error (502): Bad Gateway");
    }

    #[test]
    fn mapped_statuses_carry_the_detail_field() {
        let err = classify(403, br#"{"detail":"You do not own this app."}"#).unwrap();
        assert_eq!(err.detail(), Some("You do not own this app."));
        assert_eq!(err.to_string(), ErrorKind::Forbidden.message());
    }

    #[test]
    fn unknown_errors_keep_bytes_that_are_not_utf8() {
        let body = b"\xff\xfe<html>Bad Gateway</html>";
        let err = classify(502, body).unwrap();
        assert_eq!(err.raw_body(), body);
        assert_eq!(err.detail(), Some("\u{fffd}\u{fffd}<html>Bad Gateway</html>"));
    }

    #[test]
    fn classified_errors_have_no_raw_body() {
        let err = classify(404, br#"{"detail":"Not found."}"#).unwrap();
        assert!(err.raw_body().is_empty());
    }
}
