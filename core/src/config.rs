//! Session configuration.
//!
//! `ClientConfig` is plain serde data so the embedding application can load it
//! from whatever file format it already uses, or from the environment with
//! [`ClientConfig::from_env`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::version::API_VERSION;

pub const ENV_URL: &str = "CONTROLLER_URL";
pub const ENV_TOKEN: &str = "CONTROLLER_TOKEN";
pub const ENV_HOOKS_TOKEN: &str = "CONTROLLER_HOOKS_TOKEN";
pub const ENV_SSL_VERIFY: &str = "CONTROLLER_SSL_VERIFY";
pub const ENV_TIMEOUT_SECS: &str = "CONTROLLER_TIMEOUT_SECS";

/// User agent sent when none is configured.
pub fn default_user_agent() -> String {
    format!("controller-sdk-rust/{API_VERSION}")
}

fn default_verify_ssl() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Controller address. A missing scheme defaults to `http://`.
    pub controller_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Shared secret of the build agent, sent as `X-Deis-Builder-Auth`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks_token: Option<String>,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn new(controller_url: impl Into<String>) -> Self {
        Self {
            controller_url: controller_url.into(),
            token: None,
            hooks_token: None,
            verify_ssl: true,
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from `lookup`, which resolves variable names such as
    /// [`ENV_URL`] to their values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let controller_url = lookup(ENV_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ApiError::Config(format!("{ENV_URL} is not set")))?;

        let mut config = Self::new(controller_url);
        config.token = lookup(ENV_TOKEN).filter(|token| !token.is_empty());
        config.hooks_token = lookup(ENV_HOOKS_TOKEN).filter(|token| !token.is_empty());

        if let Some(raw) = lookup(ENV_SSL_VERIFY) {
            config.verify_ssl = parse_bool(&raw).ok_or_else(|| {
                ApiError::Config(format!("{ENV_SSL_VERIFY} must be a boolean, got '{raw}'"))
            })?;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse().map_err(|_| {
                ApiError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"))
            })?;
            config.timeout_secs = Some(secs);
        }

        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_URL, "deis.example.com")])).unwrap();
        assert_eq!(config.controller_url, "deis.example.com");
        assert!(config.token.is_none());
        assert!(config.verify_ssl);
        assert_eq!(config.user_agent, default_user_agent());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_TOKEN, "abc")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn all_variables_are_read() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_URL, "https://deis.example.com"),
            (ENV_TOKEN, "abc"),
            (ENV_HOOKS_TOKEN, "builder"),
            (ENV_SSL_VERIFY, "false"),
            (ENV_TIMEOUT_SECS, "30"),
        ]))
        .unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.hooks_token.as_deref(), Some("builder"));
        assert!(!config.verify_ssl);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn empty_token_counts_as_unset() {
        let config =
            ClientConfig::from_lookup(lookup(&[(ENV_URL, "localhost"), (ENV_TOKEN, "")])).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_URL, "localhost"), (ENV_SSL_VERIFY, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));

        let err =
            ClientConfig::from_lookup(lookup(&[(ENV_URL, "localhost"), (ENV_TIMEOUT_SECS, "soon")]))
                .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"controller_url":"http://localhost:8000","token":"abc"}"#).unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert!(config.verify_ssl);
        assert_eq!(config.user_agent, default_user_agent());
    }
}
