use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::Whitelist;

pub struct WhitelistApi<'a> {
    pub(super) client: &'a Client,
}

impl WhitelistApi<'_> {
    pub fn list(&self, app: &str) -> Result<Whitelist> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("/v2/apps/{app}/whitelist/"));
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }

    /// Allow `addresses` (IPs or CIDR ranges) to reach the app.
    pub fn add(&self, app: &str, addresses: &[String]) -> Result<Whitelist> {
        let spec = RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{app}/whitelist/"))
            .json(&addresses_only(addresses))?;
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }

    /// The addresses travel in the body of the DELETE request.
    pub fn delete(&self, app: &str, addresses: &[String]) -> Result<()> {
        let spec = RequestSpec::new(HttpMethod::Delete, format!("/v2/apps/{app}/whitelist/"))
            .json(&addresses_only(addresses))?;
        self.client.send_empty(&spec, MismatchPolicy::Advisory)
    }
}

fn addresses_only(addresses: &[String]) -> Whitelist {
    Whitelist {
        addresses: addresses.to_vec(),
        ..Whitelist::default()
    }
}
