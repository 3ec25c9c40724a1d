use std::collections::BTreeMap;

use crate::client::Client;
use crate::error::Result;
use crate::http::{HttpMethod, MismatchPolicy, RequestSpec};
use crate::types::Pod;

pub struct Ps<'a> {
    pub(super) client: &'a Client,
}

impl Ps<'_> {
    pub fn list(&self, app: &str, page_size: usize) -> Result<(Vec<Pod>, u64)> {
        self.client
            .list(&format!("/v2/apps/{app}/pods/"), page_size, MismatchPolicy::Fatal)
    }

    /// Set the replica count of each process type in `targets`.
    pub fn scale(&self, app: &str, targets: &BTreeMap<String, u32>) -> Result<()> {
        let spec =
            RequestSpec::new(HttpMethod::Post, format!("/v2/apps/{app}/scale/")).json(targets)?;
        self.client.send_empty(&spec, MismatchPolicy::Fatal)
    }

    /// Restart pods and return the replacements.
    ///
    /// With no `process_type` every pod of the app restarts. A `name` narrows
    /// the restart to one pod of that type.
    pub fn restart(
        &self,
        app: &str,
        process_type: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Pod>> {
        let spec = RequestSpec::new(HttpMethod::Post, restart_path(app, process_type, name));
        self.client.send_json(&spec, MismatchPolicy::Advisory)
    }
}

fn restart_path(app: &str, process_type: Option<&str>, name: Option<&str>) -> String {
    let process_type = process_type.filter(|kind| !kind.is_empty());
    let name = name.filter(|name| !name.is_empty());
    match (process_type, name) {
        (None, _) => format!("/v2/apps/{app}/pods/restart/"),
        (Some(kind), None) => format!("/v2/apps/{app}/pods/{kind}/restart/"),
        (Some(kind), Some(name)) => format!("/v2/apps/{app}/pods/{kind}/{name}/restart/"),
    }
}

/// Group pods by process type, keeping their order within each group.
pub fn by_type(pods: Vec<Pod>) -> BTreeMap<String, Vec<Pod>> {
    let mut grouped: BTreeMap<String, Vec<Pod>> = BTreeMap::new();
    for pod in pods {
        grouped.entry(pod.kind.clone()).or_default().push(pod);
    }
    grouped
}
