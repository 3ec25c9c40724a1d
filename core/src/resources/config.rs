use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::Config;

pub struct ConfigApi<'a> {
    pub(super) client: &'a Client,
}

impl ConfigApi<'_> {
    pub fn list(&self, app: &str) -> Result<Config> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("/v2/apps/{app}/config/"));
        self.client.send_json(&spec, MismatchPolicy::Fatal)
    }

    /// Apply `config` as a patch and return the resulting configuration.
    ///
    /// Keys absent from `config` keep their value; keys set to
    /// `serde_json::Value::Null` are removed.
    pub fn set(&self, app: &str, config: &Config) -> Result<Config> {
        let spec =
            RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{app}/config/")).json(config)?;
        self.client.send_json(&spec, MismatchPolicy::Fatal)
    }
}
