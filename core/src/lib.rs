//! Synchronous client for the Deis Workflow controller API.
//!
//! # Overview
//! A [`Client`] holds one controller session: base URL, credentials and the
//! API versions the server last reported. Every operation funnels through
//! [`Client::request`], which decorates the call with the session headers,
//! checks protocol compatibility and turns error statuses into classified
//! [`ApiError::Controller`] values. The resource handles in [`resources`]
//! (`client.apps()`, `client.config()`, ...) wrap that primitive with typed
//! records from [`types`].
//!
//! # Design
//! - Protocol mismatch is never silently dropped: operations either fail with
//!   it or log it and continue, as chosen per operation with
//!   [`MismatchPolicy`].
//! - Error classification is a pure function of status and body
//!   ([`classify`]), so it is tested without a network.
//! - DTOs are defined independently from the mock controller crate;
//!   integration tests catch schema drift.

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod resources;
pub mod types;
pub mod version;

pub use classify::{classify, ClassifiedError, ErrorKind};
pub use client::{Client, ServerVersions};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use http::{ControllerResponse, HttpMethod, MismatchPolicy, RequestSpec};
pub use pagination::Page;
pub use version::{check_compatibility, ApiMismatch, API_VERSION};
