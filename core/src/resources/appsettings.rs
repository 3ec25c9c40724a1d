use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::AppSettings;

pub struct AppSettingsApi<'a> {
    pub(super) client: &'a Client,
}

impl AppSettingsApi<'_> {
    pub fn list(&self, app: &str) -> Result<AppSettings> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("/v2/apps/{app}/settings/"));
        self.client.send_json(&spec, MismatchPolicy::Fatal)
    }

    pub fn set(&self, app: &str, settings: &AppSettings) -> Result<AppSettings> {
        let spec = RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{app}/settings/"))
            .json(settings)?;
        self.client.send_json(&spec, MismatchPolicy::Fatal)
    }
}
