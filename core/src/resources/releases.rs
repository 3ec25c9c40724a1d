use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::{Release, ReleaseRollback};

pub struct Releases<'a> {
    pub(super) client: &'a Client,
}

impl Releases<'_> {
    pub fn list(&self, app: &str, page_size: usize) -> Result<(Vec<Release>, u64)> {
        self.client.list(
            &format!("/v2/apps/{app}/releases/"),
            page_size,
            MismatchPolicy::Advisory,
        )
    }

    pub fn get(&self, app: &str, version: i64) -> Result<Release> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("/v2/apps/{app}/releases/v{version}/"));
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }

    /// Roll back to `version`, or to the previous release when `None`.
    /// Returns the version number of the release the rollback created.
    pub fn rollback(&self, app: &str, version: Option<i64>) -> Result<i64> {
        let mut spec =
            RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{app}/releases/rollback/"));
        if let Some(version) = version {
            spec = spec.json(&ReleaseRollback { version })?;
        }
        let response: ReleaseRollback = self.client.send_json(&spec, MismatchPolicy::Advisory)?;
        Ok(response.version)
    }
}
