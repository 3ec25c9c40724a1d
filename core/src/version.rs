//! Client/server protocol version compatibility.
//!
//! # Design
//! The controller API follows semantic versioning and stays backward
//! compatible within a major version, so a server whose minor version is equal
//! to or newer than the client's is accepted. Anything else, including a
//! version string that cannot be split into `MAJOR.MINOR`, is a mismatch.
//!
//! Components are compared as strings, so minor versions are only ordered
//! correctly while they stay single-digit (`"10" < "9"`).

use thiserror::Error;

/// Protocol version this client speaks.
pub const API_VERSION: &str = "2.2";

/// The controller speaks a protocol version this client cannot rely on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API version mismatch between server ({server}) and client ({client})")]
pub struct ApiMismatch {
    /// Version reported by the controller. Empty when the header was absent.
    pub server: String,
    /// Version this client was built against.
    pub client: String,
}

/// Check that `server` can serve a client speaking `client`.
pub fn check_compatibility(server: &str, client: &str) -> Result<(), ApiMismatch> {
    let mismatch = || ApiMismatch {
        server: server.to_string(),
        client: client.to_string(),
    };

    let server_parts: Vec<&str> = server.split('.').collect();
    let client_parts: Vec<&str> = client.split('.').collect();

    if server_parts.len() < 2 || client_parts.len() < 2 {
        return Err(mismatch());
    }

    if server_parts[0] != client_parts[0] {
        return Err(mismatch());
    }

    if server_parts[1] < client_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}
