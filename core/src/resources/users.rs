use crate::client::Client;
use crate::error::Result;
use crate::http::MismatchPolicy;
use crate::types::User;

pub struct Users<'a> {
    pub(super) client: &'a Client,
}

impl Users<'_> {
    /// All registered users. Requires an administrator token.
    pub fn list(&self, page_size: usize) -> Result<(Vec<User>, u64)> {
        self.client.list("/v2/users/", page_size, MismatchPolicy::Advisory)
    }
}
