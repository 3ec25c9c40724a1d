//! Account management. All of these treat an API version mismatch as fatal:
//! credentials are not worth risking on a protocol the client may misread.

use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::{
    AuthCancelRequest, AuthLoginRequest, AuthLoginResponse, AuthPasswdRequest,
    AuthRegenerateRequest, AuthRegenerateResponse, AuthRegisterRequest, User,
};

pub struct Auth<'a> {
    pub(super) client: &'a Client,
}

impl Auth<'_> {
    pub fn register(&self, username: &str, password: &str, email: &str) -> Result<()> {
        let request = AuthRegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, "/v2/auth/register/").json(&request)?;
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }

    /// Log in and return the API token. The session token is not changed;
    /// use [`Client::set_token`] to adopt it.
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        let request = AuthLoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, "/v2/auth/login/").json(&request)?;
        let response: AuthLoginResponse = self.client.send_json(&spec, MismatchPolicy::Fatal)?;
        Ok(response.token)
    }

    /// Delete an account. `None` cancels the session user's own account.
    pub fn delete(&self, username: Option<&str>) -> Result<()> {
        let mut spec = RequestSpec::new(HttpMethod::Delete, "/v2/auth/cancel/");
        if let Some(username) = username.filter(|name| !name.is_empty()) {
            spec = spec.json(&AuthCancelRequest {
                username: username.to_string(),
            })?;
        }
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }

    /// Regenerate API tokens.
    ///
    /// With `all` set every user's token is regenerated and `None` is
    /// returned. Otherwise the token of `username` (or the session user) is
    /// regenerated and the new token returned.
    pub fn regenerate(&self, username: Option<&str>, all: bool) -> Result<Option<String>> {
        let request = if all {
            Some(AuthRegenerateRequest { name: None, all })
        } else {
            username
                .filter(|name| !name.is_empty())
                .map(|name| AuthRegenerateRequest {
                    name: Some(name.to_string()),
                    all: false,
                })
        };

        let mut spec = RequestSpec::new(HttpMethod::Post, "/v2/auth/tokens/");
        if let Some(request) = &request {
            spec = spec.json(request)?;
        }

        if all {
            self.client.send_empty(&spec, MismatchPolicy::Fatal)?;
            return Ok(None);
        }
        let response: AuthRegenerateResponse =
            self.client.send_json(&spec, MismatchPolicy::Fatal)?;
        Ok(Some(response.token))
    }

    /// Change a password. Administrators may pass `username` to change
    /// another user's password without knowing the old one.
    pub fn passwd(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        new_password: &str,
    ) -> Result<()> {
        let request = AuthPasswdRequest {
            username: username.filter(|name| !name.is_empty()).map(str::to_string),
            password: password.map(str::to_string),
            new_password: new_password.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, "/v2/auth/passwd/").json(&request)?;
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }

    /// The user owning the session token.
    pub fn whoami(&self) -> Result<User> {
        let spec = RequestSpec::new(HttpMethod::Get, "/v2/auth/whoami/");
        self.client.send_json(&spec, MismatchPolicy::Fatal)
    }
}
