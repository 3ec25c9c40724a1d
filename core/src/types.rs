//! Request and response records of the controller API.
//!
//! # Design
//! Field names match the controller's JSON exactly. Optional request fields
//! use `skip_serializing_if` so an unset field produces no key at all. Patch
//! records ([`Config`], [`AppSettings`], [`Tls`]) rely on that: a key that is
//! absent leaves the server value alone, while a key explicitly set to
//! `Value::Null` unsets it.
//!
//! Response records default every field so older or newer controllers that
//! omit a field still decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Map of process type to command, as found in a Procfile.
pub type ProcessType = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Apps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct App {
    pub created: String,
    pub id: String,
    pub owner: String,
    pub updated: String,
    /// Router URL, derived from the controller host. Not sent by the server.
    #[serde(skip)]
    pub url: String,
    pub uuid: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRunRequest {
    pub command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppRunResponse {
    pub output: String,
    #[serde(rename = "exit_code")]
    pub return_code: i32,
}

// ---------------------------------------------------------------------------
// Auth and users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub last_login: Option<String>,
    pub is_superuser: bool,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthLoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCancelRequest {
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRegenerateRequest {
    #[serde(rename = "username", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRegenerateResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPasswdRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Builds and releases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Build {
    pub app: String,
    pub created: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dockerfile: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    pub owner: String,
    pub procfile: ProcessType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sha: String,
    pub updated: String,
    pub uuid: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBuildRequest {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procfile: Option<ProcessType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    pub app: String,
    pub build: Option<String>,
    pub config: String,
    pub created: String,
    pub owner: String,
    pub summary: String,
    pub updated: String,
    pub uuid: Uuid,
    pub version: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRollback {
    pub version: i64,
}

// ---------------------------------------------------------------------------
// Config, settings and TLS
// ---------------------------------------------------------------------------

/// An app's configuration. Every map is a patch: keys left out stay as they
/// are, keys mapped to `Value::Null` are unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub memory: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub cpu: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub healthcheck: BTreeMap<String, Option<Healthcheck>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub registry: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigHookRequest {
    #[serde(rename = "receive_user")]
    pub user: String,
    #[serde(rename = "receive_repo")]
    pub app: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Healthcheck {
    pub initial_delay_seconds: i32,
    pub timeout_seconds: i32,
    pub period_seconds: i32,
    pub success_threshold: i32,
    pub failure_threshold: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecProbe>,
    #[serde(rename = "httpGet", skip_serializing_if = "Option::is_none")]
    pub http_get: Option<HttpGetProbe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_socket: Option<TcpSocketProbe>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecProbe {
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpGetProbe {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_headers: Vec<KvPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpSocketProbe {
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvPair {
    pub key: String,
    pub value: String,
}

/// Application settings. `maintenance` is always serialized: `None` sends
/// `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    pub maintenance: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tls {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_enforced: Option<bool>,
}

// ---------------------------------------------------------------------------
// Domains, certificates and keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Domain {
    pub app: String,
    pub created: String,
    pub domain: String,
    pub owner: String,
    pub updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCreateRequest {
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cert {
    pub updated: String,
    pub created: String,
    pub name: String,
    pub common_name: String,
    pub expires: String,
    pub starts: String,
    pub fingerprint: String,
    pub san: Vec<String>,
    pub domains: Vec<String>,
    pub issuer: String,
    pub subject: String,
    pub id: i64,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertCreateRequest {
    pub certificate: String,
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertAttachRequest {
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Key {
    pub created: String,
    pub id: String,
    pub owner: String,
    pub public: String,
    pub updated: String,
    pub uuid: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCreateRequest {
    pub id: String,
    pub public: String,
}

// ---------------------------------------------------------------------------
// Permissions, processes and whitelist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermsAppResponse {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermsRequest {
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pod {
    pub release: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub state: String,
    pub started: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Whitelist {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    pub addresses: Vec<String>,
}

// ---------------------------------------------------------------------------
// Build agent hooks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserApps {
    pub username: String,
    pub apps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildHookRequest {
    pub sha: String,
    #[serde(rename = "receive_user")]
    pub user: String,
    #[serde(rename = "receive_repo")]
    pub app: String,
    pub image: String,
    pub procfile: ProcessType,
    pub dockerfile: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct BuildHookResponse {
    pub release: ReleaseRollback,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_config_fields_produce_no_keys() {
        let config = Config::default();
        assert_eq!(serde_json::to_value(&config).unwrap(), json!({}));
    }

    #[test]
    fn null_config_values_are_sent_as_null() {
        let mut config = Config::default();
        config.values.insert("FOO".to_string(), Value::String("bar".to_string()));
        config.values.insert("OLD".to_string(), Value::Null);
        config.routable = Some(false);

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"values": {"FOO": "bar", "OLD": null}, "routable": false})
        );
    }

    #[test]
    fn unset_maintenance_is_serialized_as_null() {
        let settings = AppSettings::default();
        assert_eq!(
            serde_json::to_value(&settings).unwrap(),
            json!({"maintenance": null})
        );
    }

    #[test]
    fn app_create_without_id_is_empty_object() {
        let request = AppCreateRequest::default();
        assert_eq!(serde_json::to_string(&request).unwrap(), "{}");
    }

    #[test]
    fn regenerate_request_omits_unset_fields() {
        let all = AuthRegenerateRequest {
            name: None,
            all: true,
        };
        assert_eq!(serde_json::to_value(&all).unwrap(), json!({"all": true}));

        let named = AuthRegenerateRequest {
            name: Some("alice".to_string()),
            all: false,
        };
        assert_eq!(serde_json::to_value(&named).unwrap(), json!({"username": "alice"}));
    }

    #[test]
    fn hook_requests_use_receive_field_names() {
        let request = ConfigHookRequest {
            user: "alice".to_string(),
            app: "example".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"receive_user": "alice", "receive_repo": "example"})
        );
    }

    #[test]
    fn pod_type_field_is_renamed() {
        let pod: Pod = serde_json::from_value(json!({
            "release": "v2",
            "type": "web",
            "name": "example-web-1",
            "state": "up",
            "started": "2016-02-13T00:47:52"
        }))
        .unwrap();
        assert_eq!(pod.kind, "web");
    }

    #[test]
    fn healthcheck_uses_camel_case() {
        let check = Healthcheck {
            initial_delay_seconds: 5,
            http_get: Some(HttpGetProbe {
                path: "/".to_string(),
                port: 80,
                http_headers: Vec::new(),
            }),
            ..Healthcheck::default()
        };
        let value = serde_json::to_value(&check).unwrap();
        assert_eq!(value["initialDelaySeconds"], 5);
        assert_eq!(value["httpGet"]["port"], 80);
        assert!(value.get("exec").is_none());
    }

    #[test]
    fn app_url_is_never_serialized() {
        let app = App {
            id: "example".to_string(),
            url: "example.local".to_string(),
            ..App::default()
        };
        assert!(serde_json::to_value(&app).unwrap().get("url").is_none());
    }
}
