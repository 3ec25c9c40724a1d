use crate::client::Client;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::{App, AppCreateRequest, AppRunRequest, AppRunResponse, AppUpdateRequest};

/// Router hosts conventionally live under the controller's domain minus this
/// prefix.
const ROUTER_PREFIX: &str = "deis.";

pub struct Apps<'a> {
    pub(super) client: &'a Client,
}

impl Apps<'_> {
    /// First `page_size` apps visible to the user, plus the total count.
    pub fn list(&self, page_size: usize) -> Result<(Vec<App>, u64)> {
        let (mut apps, count) = self
            .client
            .list::<App>("/v2/apps/", page_size, MismatchPolicy::Advisory)?;
        for app in &mut apps {
            app.url = self.app_url(&app.id);
        }
        Ok((apps, count))
    }

    /// Create an app. Without an `id` the controller picks a random name.
    pub fn create(&self, id: Option<&str>) -> Result<App> {
        let request = AppCreateRequest {
            id: id.filter(|id| !id.is_empty()).map(str::to_string),
        };
        let spec = RequestSpec::new(HttpMethod::Post, "/v2/apps/").json(&request)?;
        let app: App = self.client.send_json(&spec, MismatchPolicy::Advisory)?;
        Ok(self.with_url(app))
    }

    pub fn get(&self, id: &str) -> Result<App> {
        let spec = RequestSpec::new(HttpMethod::Get, format!("/v2/apps/{id}/"));
        let app: App = self.client.send_json(&spec, MismatchPolicy::Advisory)?;
        Ok(self.with_url(app))
    }

    /// Fetch the app's log buffer. `lines` limits the output to the most
    /// recent lines; `None` returns everything the controller holds.
    pub fn logs(&self, id: &str, lines: Option<u32>) -> Result<String> {
        let mut path = format!("/v2/apps/{id}/logs");
        if let Some(lines) = lines.filter(|lines| *lines > 0) {
            path.push_str(&format!("?log_lines={lines}"));
        }

        let raw = self
            .client
            .send(&RequestSpec::new(HttpMethod::Get, path))?
            .checked(MismatchPolicy::Advisory)?
            .text()?;
        decode_logs(&raw)
    }

    /// Run a one-off command in a fresh container of the app.
    pub fn run(&self, id: &str, command: &str) -> Result<AppRunResponse> {
        let request = AppRunRequest {
            command: command.to_string(),
        };
        let spec = RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{id}/run")).json(&request)?;
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let spec = RequestSpec::new(HttpMethod::Delete, format!("/v2/apps/{id}/"));
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }

    /// Hand the app over to `username`.
    pub fn transfer(&self, id: &str, username: &str) -> Result<()> {
        let request = AppUpdateRequest {
            owner: Some(username.to_string()),
        };
        let spec = RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{id}/")).json(&request)?;
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }

    fn with_url(&self, mut app: App) -> App {
        app.url = self.app_url(&app.id);
        app
    }

    fn app_url(&self, id: &str) -> String {
        let url = self.client.controller_url();
        let host = url.host_str().unwrap_or_default();
        let host = host.strip_prefix(ROUTER_PREFIX).unwrap_or(host);
        match url.port() {
            Some(port) => format!("{id}.{host}:{port}"),
            None => format!("{id}.{host}"),
        }
    }
}

/// The log endpoint answers with a JSON string; older controllers send the
/// text bare.
fn decode_logs(raw: &str) -> Result<String> {
    let logs = serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.to_string());
    if logs.trim().is_empty() {
        return Err(ApiError::NoLogs);
    }
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_url_strips_router_prefix_and_keeps_port() {
        let client = Client::new(true, "http://deis.example.com:8080", "").unwrap();
        assert_eq!(client.apps().app_url("example"), "example.example.com:8080");

        let client = Client::new(true, "https://controller.local", "").unwrap();
        assert_eq!(client.apps().app_url("example"), "example.controller.local");
    }

    #[test]
    fn json_encoded_logs_are_unquoted() {
        let logs = decode_logs("\"2016-07-27 web.1: started\\n\"").unwrap();
        assert_eq!(logs, "2016-07-27 web.1: started\n");
    }

    #[test]
    fn bare_logs_are_returned_as_is() {
        assert_eq!(decode_logs("web.1: started").unwrap(), "web.1: started");
    }

    #[test]
    fn empty_logs_are_no_logs() {
        assert!(matches!(decode_logs(""), Err(ApiError::NoLogs)));
        assert!(matches!(decode_logs("\"\""), Err(ApiError::NoLogs)));
        assert!(matches!(decode_logs("\"\\n\""), Err(ApiError::NoLogs)));
    }
}
