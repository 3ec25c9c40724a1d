//! In-memory stand-in for the Workflow controller, for tests and local runs.
//!
//! Implements the subset of the v2 API the client's integration tests need,
//! with the controller's status codes and error bodies. Every response carries
//! the `DEIS_API_VERSION` / `DEIS_PLATFORM_VERSION` headers, and every request
//! is recorded so tests can assert on what the client actually sent.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_API_VERSION: &str = "2.2";
pub const DEFAULT_PLATFORM_VERSION: &str = "v2.9.0";

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "hunter2";
pub const ADMIN_TOKEN: &str = "0123456789abcdef";
pub const HOOKS_TOKEN: &str = "builder-secret";

const API_VERSION_HEADER: HeaderName = HeaderName::from_static("deis_api_version");
const PLATFORM_VERSION_HEADER: HeaderName = HeaderName::from_static("deis_platform_version");
const TIMESTAMP: &str = "2016-08-22T17:40:16Z";
const PROCESS_TYPES: &[&str] = &["web", "worker", "cmd"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    pub owner: String,
    pub uuid: Uuid,
    pub created: String,
    pub updated: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub release: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub state: String,
    pub started: String,
}

/// A request as it reached the mock. Header names are lowercase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

#[derive(Debug)]
struct AppRecord {
    app: App,
    values: Map<String, Value>,
    logs: String,
    pods: Vec<Pod>,
}

#[derive(Debug, Clone)]
struct Versions {
    api: Option<String>,
    platform: Option<String>,
}

type Db = Arc<RwLock<BTreeMap<String, AppRecord>>>;

/// Shared state of one mock controller. Cloning shares the state.
#[derive(Clone, Debug)]
pub struct Controller {
    apps: Db,
    versions: Arc<Mutex<Versions>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            apps: Arc::new(RwLock::new(BTreeMap::new())),
            versions: Arc::new(Mutex::new(Versions {
                api: Some(DEFAULT_API_VERSION.to_string()),
                platform: Some(DEFAULT_PLATFORM_VERSION.to_string()),
            })),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Change the version headers sent from now on. `None` omits the header.
    pub fn set_versions(&self, api: Option<&str>, platform: Option<&str>) {
        let mut versions = self.versions.lock().unwrap_or_else(PoisonError::into_inner);
        versions.api = api.map(str::to_string);
        versions.platform = platform.map(str::to_string);
    }

    pub fn set_api_version(&self, api: &str) {
        let mut versions = self.versions.lock().unwrap_or_else(PoisonError::into_inner);
        versions.api = Some(api.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    fn record(&self, request: RecordedRequest) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }

    fn versions(&self) -> Versions {
        self.versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub fn app(controller: Controller) -> Router {
    Router::new()
        .route("/v2/", get(probe))
        .route("/healthz", get(healthz))
        .route("/v2/auth/login/", post(login))
        .route("/v2/auth/whoami/", get(whoami))
        .route("/v2/apps/", get(list_apps).post(create_app))
        .route("/v2/apps/{id}/", get(get_app).delete(delete_app))
        .route("/v2/apps/{id}/config/", get(get_config).post(set_config))
        .route("/v2/apps/{id}/logs", get(app_logs))
        .route("/v2/apps/{id}/pods/", get(list_pods))
        .route("/v2/apps/{id}/scale/", post(scale))
        .route("/v2/hooks/config/", post(hook_config))
        .route("/v2/broken/", get(broken))
        .fallback(unrouted)
        .layer(middleware::from_fn_with_state(controller.clone(), stamp))
        .with_state(controller)
}

pub async fn run(listener: TcpListener, controller: Controller) -> Result<(), std::io::Error> {
    axum::serve(listener, app(controller)).await
}

/// Serve `controller` on a random local port from a background thread and
/// return its address. The server lives until the process exits.
pub fn spawn(controller: Controller) -> std::io::Result<SocketAddr> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::spawn(move || {
        let served = runtime.block_on(async move {
            match TcpListener::from_std(std_listener) {
                Ok(listener) => run(listener, controller).await,
                Err(err) => Err(err),
            }
        });
        if let Err(err) = served {
            tracing::error!(%err, "mock controller stopped");
        }
    });

    Ok(addr)
}

/// Record the request and stamp the version headers on the response.
async fn stamp(State(controller): State<Controller>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Ok(bytes) = to_bytes(body, usize::MAX).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    tracing::debug!(method = %parts.method, path = parts.uri.path(), "mock controller request");
    controller.record(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    });

    let mut response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let versions = controller.versions();
    let headers = response.headers_mut();
    for (name, value) in [
        (API_VERSION_HEADER, versions.api),
        (PLATFORM_VERSION_HEADER, versions.platform),
    ] {
        if let Some(value) = value.and_then(|value| HeaderValue::from_str(&value).ok()) {
            headers.insert(name, value);
        }
    }
    response
}

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, json!({"detail": "Not found."}))
}

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("token {ADMIN_TOKEN}");
    match headers.get("authorization").and_then(|value| value.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        Some(_) => Err(error(StatusCode::UNAUTHORIZED, json!({"detail": "Invalid token."}))),
        None => Err(error(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "Authentication credentials were not provided."}),
        )),
    }
}

async fn unrouted() -> Response {
    not_found()
}

async fn probe() -> Response {
    error(
        StatusCode::UNAUTHORIZED,
        json!({"detail": "Authentication credentials were not provided."}),
    )
}

async fn healthz() -> &'static str {
    "OK"
}

async fn broken() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [("content-type", "text/html")],
        "<html><body><h1>502 Bad Gateway</h1></body></html>",
    )
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

async fn login(Json(input): Json<Credentials>) -> Response {
    let required = json!(["This field is required."]);
    match (input.username, input.password) {
        (None, _) => error(StatusCode::BAD_REQUEST, json!({"username": required})),
        (_, None) => error(StatusCode::BAD_REQUEST, json!({"password": required})),
        (Some(username), Some(password)) if username == ADMIN_USERNAME && password == ADMIN_PASSWORD => {
            Json(json!({"token": ADMIN_TOKEN})).into_response()
        }
        _ => error(
            StatusCode::BAD_REQUEST,
            json!({"non_field_errors": ["Unable to log in with provided credentials."]}),
        ),
    }
}

async fn whoami(headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    Json(json!({
        "id": 1,
        "last_login": TIMESTAMP,
        "is_superuser": true,
        "username": ADMIN_USERNAME,
        "first_name": "",
        "last_name": "",
        "email": "admin@example.com",
        "is_staff": true,
        "is_active": true,
        "date_joined": TIMESTAMP,
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

fn envelope<T: Serialize>(path: &str, records: &[T], limit: Option<usize>) -> Value {
    let limit = limit.unwrap_or(100);
    let next = (records.len() > limit).then(|| format!("{path}?limit={limit}&offset={limit}"));
    json!({
        "count": records.len(),
        "next": next,
        "previous": null,
        "results": records.iter().take(limit).collect::<Vec<_>>(),
    })
}

async fn list_apps(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let apps = controller.apps.read().await;
    let records: Vec<&App> = apps.values().map(|record| &record.app).collect();
    Json(envelope("/v2/apps/", &records, params.limit)).into_response()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppCreate {
    id: Option<String>,
}

fn valid_app_name(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

async fn create_app(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Json(input): Json<AppCreate>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }

    let id = input
        .id
        .unwrap_or_else(|| format!("app-{}", &Uuid::new_v4().simple().to_string()[..8]));
    if !valid_app_name(&id) {
        return error(
            StatusCode::BAD_REQUEST,
            json!({"id": ["App name can only contain a-z (lowercase), 0-9 and hyphens"]}),
        );
    }

    let mut apps = controller.apps.write().await;
    if apps.contains_key(&id) {
        return error(
            StatusCode::BAD_REQUEST,
            json!({"id": ["App with this id already exists."]}),
        );
    }

    let app = App {
        id: id.clone(),
        owner: ADMIN_USERNAME.to_string(),
        uuid: Uuid::new_v4(),
        created: TIMESTAMP.to_string(),
        updated: TIMESTAMP.to_string(),
    };
    apps.insert(
        id.clone(),
        AppRecord {
            app: app.clone(),
            values: Map::new(),
            logs: String::new(),
            pods: pods_for(&id, &BTreeMap::from([("web".to_string(), 1)])),
        },
    );
    (StatusCode::CREATED, Json(app)).into_response()
}

async fn get_app(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let apps = controller.apps.read().await;
    match apps.get(&id) {
        Some(record) => Json(record.app.clone()).into_response(),
        None => not_found(),
    }
}

async fn delete_app(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    match controller.apps.write().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

fn config_body(record: &AppRecord) -> Value {
    json!({
        "owner": record.app.owner,
        "app": record.app.id,
        "values": record.values,
        "memory": {},
        "cpu": {},
        "tags": {},
        "registry": {},
        "healthcheck": {},
        "created": TIMESTAMP,
        "updated": TIMESTAMP,
        "uuid": Uuid::new_v4(),
    })
}

async fn get_config(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let apps = controller.apps.read().await;
    match apps.get(&id) {
        Some(record) => Json(config_body(record)).into_response(),
        None => not_found(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigPatch {
    values: Map<String, Value>,
}

/// `null` values unset the key; everything else overwrites.
async fn set_config(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<ConfigPatch>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let mut apps = controller.apps.write().await;
    let Some(record) = apps.get_mut(&id) else {
        return not_found();
    };

    for (key, value) in patch.values {
        if value.is_null() {
            record.values.remove(&key);
        } else {
            record.values.insert(key, value);
        }
    }
    record.logs.push_str(&format!("{id}: config changed\n"));
    (StatusCode::CREATED, Json(config_body(record))).into_response()
}

async fn app_logs(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let apps = controller.apps.read().await;
    match apps.get(&id) {
        Some(record) => Json(record.logs.clone()).into_response(),
        None => not_found(),
    }
}

async fn list_pods(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let apps = controller.apps.read().await;
    match apps.get(&id) {
        Some(record) => {
            Json(envelope(&format!("/v2/apps/{id}/pods/"), &record.pods, params.limit))
                .into_response()
        }
        None => not_found(),
    }
}

fn pods_for(app: &str, targets: &BTreeMap<String, u32>) -> Vec<Pod> {
    targets
        .iter()
        .flat_map(|(kind, replicas)| {
            (1..=*replicas).map(move |n| Pod {
                release: "v2".to_string(),
                kind: kind.clone(),
                name: format!("{app}-{kind}-{n}"),
                state: "up".to_string(),
                started: TIMESTAMP.to_string(),
            })
        })
        .collect()
}

async fn scale(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(targets): Json<BTreeMap<String, u32>>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    if let Some(unknown) = targets
        .keys()
        .find(|kind| !PROCESS_TYPES.contains(&kind.as_str()))
    {
        return error(
            StatusCode::BAD_REQUEST,
            json!({"detail": format!("Container type {unknown} does not exist in application")}),
        );
    }

    let mut apps = controller.apps.write().await;
    let Some(record) = apps.get_mut(&id) else {
        return not_found();
    };

    let mut counts: HashMap<String, u32> = HashMap::new();
    for pod in &record.pods {
        *counts.entry(pod.kind.clone()).or_default() += 1;
    }
    counts.extend(targets.iter().map(|(kind, n)| (kind.clone(), *n)));
    record.pods = pods_for(&id, &counts.into_iter().collect());
    record.logs.push_str(&format!("{id}: scaled\n"));
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Debug, Deserialize)]
struct ConfigHook {
    receive_user: String,
    receive_repo: String,
}

async fn hook_config(
    State(controller): State<Controller>,
    headers: HeaderMap,
    Json(input): Json<ConfigHook>,
) -> Response {
    let builder_auth = headers
        .get("x-deis-builder-auth")
        .and_then(|value| value.to_str().ok());
    if builder_auth != Some(HOOKS_TOKEN) {
        return error(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "Authentication credentials were not provided."}),
        );
    }

    let apps = controller.apps.read().await;
    match apps.get(&input.receive_repo) {
        Some(record) if record.app.owner == input.receive_user => {
            Json(config_body(record)).into_response()
        }
        Some(_) => error(
            StatusCode::FORBIDDEN,
            json!({"detail": "You do not have permission to perform this action."}),
        ),
        None => not_found(),
    }
}
