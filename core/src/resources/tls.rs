use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::Tls;

pub struct TlsApi<'a> {
    pub(super) client: &'a Client,
}

impl TlsApi<'_> {
    pub fn info(&self, app: &str) -> Result<Tls> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("/v2/apps/{app}/tls/"));
        self.client.send_json(&spec, MismatchPolicy::Fatal)
    }

    /// Redirect plain HTTP traffic to HTTPS.
    pub fn enable(&self, app: &str) -> Result<Tls> {
        self.set_enforced(app, true)
    }

    /// Stop redirecting plain HTTP traffic.
    pub fn disable(&self, app: &str) -> Result<Tls> {
        self.set_enforced(app, false)
    }

    fn set_enforced(&self, app: &str, https_enforced: bool) -> Result<Tls> {
        let request = Tls {
            https_enforced: Some(https_enforced),
            ..Tls::default()
        };
        let spec =
            RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{app}/tls/")).json(&request)?;
        self.client.send_json(&spec, MismatchPolicy::Fatal)
    }
}
