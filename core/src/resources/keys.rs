use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::{Key, KeyCreateRequest};

pub struct Keys<'a> {
    pub(super) client: &'a Client,
}

impl Keys<'_> {
    pub fn list(&self, page_size: usize) -> Result<(Vec<Key>, u64)> {
        self.client.list("/v2/keys/", page_size, MismatchPolicy::Fatal)
    }

    /// Register an SSH public key under `id`.
    pub fn create(&self, id: &str, public: &str) -> Result<Key> {
        let request = KeyCreateRequest {
            id: id.to_string(),
            public: public.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, "/v2/keys/").json(&request)?;
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let spec = RequestSpec::new(HttpMethod::Delete, format!("/v2/keys/{id}"));
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }
}
