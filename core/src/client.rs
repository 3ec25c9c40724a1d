//! Session state and the request primitive every operation goes through.
//!
//! # Design
//! `Client` is created once and shared by reference. It is immutable while
//! requests are in flight except for the observed server versions, which are
//! rewritten from the `DEIS_API_VERSION` / `DEIS_PLATFORM_VERSION` headers of
//! every response, error responses included. Concurrent requests race on those
//! two fields and the last write wins; they only feed diagnostics.
//!
//! The underlying agent keeps no idle connections, so every request opens a
//! fresh connection. HTTP error statuses come back as data and are labelled by
//! [`classify`](crate::classify::classify).

use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::de::DeserializeOwned;
use ureq::http::{HeaderMap, Response};
use ureq::tls::TlsConfig;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, Body, Proxy, RequestBuilder};
use url::Url;

use crate::classify::{classify, ClassifiedError};
use crate::config::{default_user_agent, ClientConfig};
use crate::error::{ApiError, Result};
use crate::http::{split_path, ControllerResponse, HttpMethod, MismatchPolicy, RequestSpec};
use crate::version::{check_compatibility, API_VERSION};

pub const API_VERSION_HEADER: &str = "DEIS_API_VERSION";
pub const PLATFORM_VERSION_HEADER: &str = "DEIS_PLATFORM_VERSION";
pub const HOOKS_TOKEN_HEADER: &str = "X-Deis-Builder-Auth";

/// Answers 401 on a real controller.
const PROBE_PATH: &str = "/v2/";
const HEALTHCHECK_PATH: &str = "/healthz";

/// Versions the controller reported on its most recent response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerVersions {
    pub api: Option<String>,
    pub platform: Option<String>,
}

/// A session with one controller.
pub struct Client {
    agent: Agent,
    controller_url: Url,
    verify_ssl: bool,
    token: Option<String>,
    hooks_token: Option<String>,
    user_agent: String,
    observed: RwLock<ServerVersions>,
}

impl Client {
    /// Connect to `controller_url` with `token`. An empty token sends no
    /// `Authorization` header.
    pub fn new(verify_ssl: bool, controller_url: &str, token: &str) -> Result<Self> {
        let mut config = ClientConfig::new(controller_url);
        config.verify_ssl = verify_ssl;
        config.token = Some(token.to_string());
        Self::from_config(&config)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let controller_url = parse_controller_url(&config.controller_url)?;
        let user_agent = if config.user_agent.is_empty() {
            default_user_agent()
        } else {
            config.user_agent.clone()
        };

        Ok(Self {
            agent: build_agent(config),
            controller_url,
            verify_ssl: config.verify_ssl,
            token: non_empty(config.token.clone()),
            hooks_token: non_empty(config.hooks_token.clone()),
            user_agent,
            observed: RwLock::new(ServerVersions::default()),
        })
    }

    pub fn controller_url(&self) -> &Url {
        &self.controller_url
    }

    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = non_empty(Some(token.into()));
    }

    pub fn hooks_token(&self) -> Option<&str> {
        self.hooks_token.as_deref()
    }

    pub fn set_hooks_token(&mut self, token: impl Into<String>) {
        self.hooks_token = non_empty(Some(token.into()));
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    pub fn server_versions(&self) -> ServerVersions {
        self.observed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// API version from the most recent response that carried one.
    pub fn controller_api_version(&self) -> Option<String> {
        self.server_versions().api
    }

    /// Platform version from the most recent response that carried one.
    pub fn platform_version(&self) -> Option<String> {
        self.server_versions().platform
    }

    /// Issue one request. `path` may carry a raw query string after the first `?`.
    ///
    /// Error statuses come back as [`ApiError::Controller`]. A successful
    /// response is returned unread; an API version mismatch is attached to it
    /// (or to the error) for the caller to judge.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<ControllerResponse> {
        let (path, query) = split_path(path);
        let url = self.endpoint(path, query);

        tracing::debug!(%method, %url, "sending controller request");
        let response = self.dispatch(method, url.as_str(), body)?;
        self.handle_response(response)
    }

    pub fn send(&self, spec: &RequestSpec) -> Result<ControllerResponse> {
        self.request(spec.method, &spec.path, spec.body.as_deref())
    }

    /// Send `spec` and decode the JSON response after applying `policy`.
    pub fn send_json<T: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
        policy: MismatchPolicy,
    ) -> Result<T> {
        self.send(spec)?.checked(policy)?.json()
    }

    /// Send `spec` and release the response without reading it.
    pub fn send_empty(&self, spec: &RequestSpec, policy: MismatchPolicy) -> Result<()> {
        self.send(spec)?.checked(policy)?.discard();
        Ok(())
    }

    /// Issue one request and read the whole body as text. A version mismatch
    /// is fatal.
    pub fn basic_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<String> {
        self.request(method, path, body)?
            .checked(MismatchPolicy::Fatal)?
            .text()
    }

    /// Confirm the URL points at a controller: the unauthenticated probe must
    /// answer exactly 401.
    pub fn check_connection(&self) -> Result<()> {
        let url = self.endpoint(PROBE_PATH, None);
        let invalid = |source: Option<ureq::Error>| ApiError::InvalidController {
            url: self.controller_url.as_str().trim_end_matches('/').to_string(),
            source,
        };

        tracing::debug!(%url, "probing controller");
        let response = self
            .agent
            .get(url.as_str())
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|err| invalid(Some(err)))?;

        if response.status().as_u16() != 401 {
            tracing::debug!(status = response.status().as_u16(), "probe did not answer 401");
            return Err(invalid(None));
        }

        let api_version = self.record_versions(response.headers());
        check_compatibility(api_version.as_deref().unwrap_or_default(), API_VERSION)?;
        Ok(())
    }

    /// Check the controller's liveness endpoint.
    pub fn healthcheck(&self) -> Result<()> {
        let url = self.endpoint(HEALTHCHECK_PATH, None);
        let mut response = self
            .agent
            .get(url.as_str())
            .header("User-Agent", self.user_agent.as_str())
            .call()?;

        let status = response.status().as_u16();
        if is_error_status(status) {
            return Err(ApiError::Controller {
                error: classify_error(status, response.body_mut().read_to_vec()),
                mismatch: None,
            });
        }
        Ok(())
    }

    fn endpoint(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.controller_url.clone();
        url.set_path(path);
        url.set_query(query);
        url
    }

    fn dispatch(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&[u8]>,
    ) -> std::result::Result<Response<Body>, ureq::Error> {
        match method {
            HttpMethod::Get => self.send_without_body(self.agent.get(url), body),
            HttpMethod::Delete => self.send_without_body(self.agent.delete(url), body),
            HttpMethod::Post => self.send_with_body(self.agent.post(url), body),
            HttpMethod::Put => self.send_with_body(self.agent.put(url), body),
            HttpMethod::Patch => self.send_with_body(self.agent.patch(url), body),
        }
    }

    fn send_without_body(
        &self,
        builder: RequestBuilder<WithoutBody>,
        body: Option<&[u8]>,
    ) -> std::result::Result<Response<Body>, ureq::Error> {
        let builder = self.decorate(builder);
        match body {
            Some(body) if !body.is_empty() => builder.force_send_body().send(body),
            _ => builder.call(),
        }
    }

    fn send_with_body(
        &self,
        builder: RequestBuilder<WithBody>,
        body: Option<&[u8]>,
    ) -> std::result::Result<Response<Body>, ureq::Error> {
        let builder = self.decorate(builder);
        match body {
            Some(body) => builder.send(body),
            None => builder.send_empty(),
        }
    }

    fn decorate<B>(&self, builder: RequestBuilder<B>) -> RequestBuilder<B> {
        let mut builder = builder
            .header("Content-Type", "application/json")
            .header("User-Agent", self.user_agent.as_str());

        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("token {token}"));
        }
        if let Some(token) = &self.hooks_token {
            builder = builder.header(HOOKS_TOKEN_HEADER, token.as_str());
        }
        builder
    }

    fn handle_response(&self, response: Response<Body>) -> Result<ControllerResponse> {
        let (parts, mut body) = response.into_parts();
        let status = parts.status.as_u16();
        tracing::debug!(status, "controller responded");

        let api_version = self.record_versions(&parts.headers);
        let mismatch =
            check_compatibility(api_version.as_deref().unwrap_or_default(), API_VERSION).err();

        if is_error_status(status) {
            let error = classify_error(status, body.read_to_vec());
            tracing::debug!(status, kind = ?error.kind(), "controller returned an error");
            return Err(ApiError::Controller { error, mismatch });
        }

        Ok(ControllerResponse::new(status, parts.headers, body, mismatch))
    }

    /// Store whichever version headers are present and return the API version.
    fn record_versions(&self, headers: &HeaderMap) -> Option<String> {
        let api = header_value(headers, API_VERSION_HEADER);
        let platform = header_value(headers, PLATFORM_VERSION_HEADER);

        if api.is_some() || platform.is_some() {
            let mut observed = self
                .observed
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(api) = &api {
                observed.api = Some(api.clone());
            }
            if let Some(platform) = platform {
                observed.platform = Some(platform);
            }
        }
        api
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("controller_url", &self.controller_url.as_str())
            .field("verify_ssl", &self.verify_ssl)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("hooks_token", &self.hooks_token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("observed", &self.server_versions())
            .finish_non_exhaustive()
    }
}

/// Parse a controller address leniently: surrounding whitespace is trimmed and
/// `http://` is assumed when no scheme is given.
pub fn parse_controller_url(raw: &str) -> Result<Url> {
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("the URL is empty".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let mut url = Url::parse(&candidate).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("the URL has no host".to_string()));
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_agent(config: &ClientConfig) -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .max_idle_connections(0)
        .max_idle_connections_per_host(0)
        .proxy(Proxy::try_from_env())
        .tls_config(
            TlsConfig::builder()
                .disable_verification(!config.verify_ssl)
                .build(),
        )
        .timeout_global(config.timeout())
        .build()
        .new_agent()
}

fn is_error_status(status: u16) -> bool {
    !(200..400).contains(&status)
}

/// A body that cannot be read still yields an error carrying `status`, with
/// the read failure as its text.
fn classify_error(status: u16, body: std::result::Result<Vec<u8>, ureq::Error>) -> ClassifiedError {
    match body {
        Ok(raw) => classify(status, &raw).unwrap_or_else(|| ClassifiedError::unknown(status, &raw)),
        Err(err) => {
            tracing::debug!(status, error = %err, "failed to read error response body");
            ClassifiedError::unknown(status, err.to_string().as_bytes())
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
