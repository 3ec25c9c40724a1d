//! Endpoints used by the build agent while handling a `git push`.
//!
//! The controller authenticates these with the shared hooks secret, so the
//! client must have one set via [`Client::set_hooks_token`] or the config.

use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::{BuildHookRequest, BuildHookResponse, Config, ConfigHookRequest, ProcessType, UserApps};

pub struct Hooks<'a> {
    pub(super) client: &'a Client,
}

impl Hooks<'_> {
    /// Look up the owner of an SSH key and the apps they can push to.
    pub fn user_from_key(&self, fingerprint: &str) -> Result<UserApps> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("/v2/hooks/key/{fingerprint}"));
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }

    /// Configuration of `app` as seen by `username`.
    pub fn app_config(&self, username: &str, app: &str) -> Result<Config> {
        let request = ConfigHookRequest {
            user: username.to_string(),
            app: app.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, "/v2/hooks/config/").json(&request)?;
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }

    /// Record a finished build and return the version of the release it
    /// produced.
    pub fn create_build(
        &self,
        username: &str,
        app: &str,
        image: &str,
        sha: &str,
        procfile: ProcessType,
        using_dockerfile: bool,
    ) -> Result<i64> {
        let request = BuildHookRequest {
            sha: sha.to_string(),
            user: username.to_string(),
            app: app.to_string(),
            image: image.to_string(),
            procfile,
            dockerfile: if using_dockerfile { "true" } else { "" }.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, "/v2/hooks/build/").json(&request)?;
        let response: BuildHookResponse = self.client.send_json(&spec, MismatchPolicy::Advisory)?;
        Ok(response.release.version)
    }
}
