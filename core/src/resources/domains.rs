use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::{Domain, DomainCreateRequest};

pub struct Domains<'a> {
    pub(super) client: &'a Client,
}

impl Domains<'_> {
    pub fn list(&self, app: &str, page_size: usize) -> Result<(Vec<Domain>, u64)> {
        self.client.list(
            &format!("/v2/apps/{app}/domains/"),
            page_size,
            MismatchPolicy::Fatal,
        )
    }

    pub fn create(&self, app: &str, domain: &str) -> Result<Domain> {
        let request = DomainCreateRequest {
            domain: domain.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{app}/domains/"))
            .json(&request)?;
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }

    pub fn delete(&self, app: &str, domain: &str) -> Result<()> {
        let spec = RequestSpec::new(HttpMethod::Delete, format!("/v2/apps/{app}/domains/{domain}"));
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }
}
