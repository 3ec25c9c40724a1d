//! App collaborators and cluster administrators.

use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::{PermsAppResponse, PermsRequest};

const ADMIN_PERMS_PATH: &str = "/v2/admin/perms/";

pub struct Perms<'a> {
    pub(super) client: &'a Client,
}

impl Perms<'_> {
    /// Usernames allowed to manage `app`.
    pub fn list(&self, app: &str) -> Result<Vec<String>> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("/v2/apps/{app}/perms/"));
        let response: PermsAppResponse = self.client.send_json(&spec, MismatchPolicy::Fatal)?;
        Ok(response.users)
    }

    pub fn list_admins(&self, page_size: usize) -> Result<(Vec<String>, u64)> {
        let (admins, count) =
            self.client
                .list::<PermsRequest>(ADMIN_PERMS_PATH, page_size, MismatchPolicy::Fatal)?;
        Ok((admins.into_iter().map(|admin| admin.username).collect(), count))
    }

    pub fn create(&self, app: &str, username: &str) -> Result<()> {
        self.grant(&format!("/v2/apps/{app}/perms/"), username)
    }

    pub fn create_admin(&self, username: &str) -> Result<()> {
        self.grant(ADMIN_PERMS_PATH, username)
    }

    pub fn delete(&self, app: &str, username: &str) -> Result<()> {
        self.revoke(&format!("/v2/apps/{app}/perms/{username}"))
    }

    pub fn delete_admin(&self, username: &str) -> Result<()> {
        self.revoke(&format!("{ADMIN_PERMS_PATH}{username}"))
    }

    fn grant(&self, path: &str, username: &str) -> Result<()> {
        let request = PermsRequest {
            username: username.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, path).json(&request)?;
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }

    fn revoke(&self, path: &str) -> Result<()> {
        let spec = RequestSpec::new(HttpMethod::Delete, path);
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }
}
