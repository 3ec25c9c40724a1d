use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::{Cert, CertAttachRequest, CertCreateRequest};

pub struct Certs<'a> {
    pub(super) client: &'a Client,
}

impl Certs<'_> {
    pub fn list(&self, page_size: usize) -> Result<(Vec<Cert>, u64)> {
        self.client.list("/v2/certs/", page_size, MismatchPolicy::Advisory)
    }

    /// Upload a PEM certificate and its private key under `name`.
    pub fn create(&self, certificate: &str, key: &str, name: &str) -> Result<Cert> {
        let request = CertCreateRequest {
            certificate: certificate.to_string(),
            key: key.to_string(),
            name: name.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, "/v2/certs/").json(&request)?;
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }

    pub fn get(&self, name: &str) -> Result<Cert> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("/v2/certs/{name}"));
        self.client.send_json(&spec, MismatchPolicy::Fatal)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let spec = RequestSpec::new(HttpMethod::Delete, format!("/v2/certs/{name}"));
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }

    /// Serve `domain` with the certificate `name`.
    pub fn attach(&self, name: &str, domain: &str) -> Result<()> {
        let request = CertAttachRequest {
            domain: domain.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, format!("/v2/certs/{name}/domain/"))
            .json(&request)?;
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }

    pub fn detach(&self, name: &str, domain: &str) -> Result<()> {
        let spec =
            RequestSpec::new(HttpMethod::Delete, format!("/v2/certs/{name}/domain/{domain}"));
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }
}
