use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::{Build, CreateBuildRequest, ProcessType};

pub struct Builds<'a> {
    pub(super) client: &'a Client,
}

impl Builds<'_> {
    pub fn list(&self, app: &str, page_size: usize) -> Result<(Vec<Build>, u64)> {
        self.client.list(
            &format!("/v2/apps/{app}/builds/"),
            page_size,
            MismatchPolicy::Advisory,
        )
    }

    /// Deploy `image` to `app`. An empty procfile lets the controller keep
    /// the app's current process types.
    pub fn create(&self, app: &str, image: &str, procfile: ProcessType) -> Result<Build> {
        let request = CreateBuildRequest {
            image: image.to_string(),
            procfile: (!procfile.is_empty()).then_some(procfile),
        };
        let spec =
            RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{app}/builds/")).json(&request)?;
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }
}
