//! Check classification, version compatibility and envelope decoding against
//! the JSON vectors stored in `test-vectors/`.
//!
//! The vectors are plain data so other controller clients can share them.

use controller_sdk::pagination::decode_envelope;
use controller_sdk::{check_compatibility, classify, ErrorKind};
use serde_json::Value;

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn parse_kind(s: &str) -> ErrorKind {
    match s {
        "InvalidUsername" => ErrorKind::InvalidUsername,
        "DuplicateUsername" => ErrorKind::DuplicateUsername,
        "MissingPassword" => ErrorKind::MissingPassword,
        "LoginFailed" => ErrorKind::LoginFailed,
        "InvalidAppName" => ErrorKind::InvalidAppName,
        "DuplicateApp" => ErrorKind::DuplicateApp,
        "MissingID" => ErrorKind::MissingID,
        "MissingKey" => ErrorKind::MissingKey,
        "DuplicateKey" => ErrorKind::DuplicateKey,
        "InvalidCertificate" => ErrorKind::InvalidCertificate,
        "InvalidName" => ErrorKind::InvalidName,
        "InvalidDomain" => ErrorKind::InvalidDomain,
        "DuplicateDomain" => ErrorKind::DuplicateDomain,
        "InvalidImage" => ErrorKind::InvalidImage,
        "InvalidEmail" => ErrorKind::InvalidEmail,
        "PodNotFound" => ErrorKind::PodNotFound,
        "InvalidVersion" => ErrorKind::InvalidVersion,
        "TagNotFound" => ErrorKind::TagNotFound,
        "CancellationFailed" => ErrorKind::CancellationFailed,
        "Unauthorized" => ErrorKind::Unauthorized,
        "Forbidden" => ErrorKind::Forbidden,
        "NotFound" => ErrorKind::NotFound,
        "MethodNotAllowed" => ErrorKind::MethodNotAllowed,
        "Conflict" => ErrorKind::Conflict,
        "Unprocessable" => ErrorKind::Unprocessable,
        "ServerError" => ErrorKind::ServerError,
        "Unknown" => ErrorKind::Unknown,
        other => panic!("unknown error kind: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

#[test]
fn error_vectors() {
    for case in cases(include_str!("../../test-vectors/errors.json")) {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let body = case["body"].as_str().unwrap();
        let expected = parse_kind(case["kind"].as_str().unwrap());

        let classified = classify(status, body.as_bytes())
            .unwrap_or_else(|| panic!("{name}: expected an error"));
        assert_eq!(classified.kind(), expected, "{name}: kind");
        assert_eq!(classified.status(), status, "{name}: status");

        if expected == ErrorKind::Unknown {
            assert_eq!(classified.detail(), Some(body), "{name}: raw body kept");
        }
    }
}

#[test]
fn success_statuses_are_not_errors() {
    for status in [200, 201, 204, 301, 399] {
        assert!(classify(status, b"{}").is_none(), "status {status}");
    }
}

// ---------------------------------------------------------------------------
// Version compatibility
// ---------------------------------------------------------------------------

#[test]
fn version_vectors() {
    for case in cases(include_str!("../../test-vectors/versions.json")) {
        let server = case["server"].as_str().unwrap();
        let client = case["client"].as_str().unwrap();
        let compatible = case["compatible"].as_bool().unwrap();

        let result = check_compatibility(server, client);
        assert_eq!(result.is_ok(), compatible, "server {server:?} client {client:?}");

        if let Err(mismatch) = result {
            assert_eq!(mismatch.server, server);
            assert_eq!(mismatch.client, client);
        }
    }
}

// ---------------------------------------------------------------------------
// List envelopes
// ---------------------------------------------------------------------------

#[test]
fn envelope_vectors() {
    for case in cases(include_str!("../../test-vectors/envelopes.json")) {
        let name = case["name"].as_str().unwrap();
        let body = case["body"].as_str().unwrap();
        let decoded = decode_envelope(body.as_bytes());

        match case["results"].as_str() {
            Some(expected) => {
                let (results, count) = decoded.unwrap_or_else(|err| panic!("{name}: {err}"));
                let results: Value = serde_json::from_str(&results).unwrap();
                let expected: Value = serde_json::from_str(expected).unwrap();
                assert_eq!(results, expected, "{name}: results");
                assert_eq!(Some(count), case["count"].as_u64(), "{name}: count");
            }
            None => assert!(decoded.is_err(), "{name}: expected a decode error"),
        }
    }
}
