//! Data sources for the skydeck console.
//!
//! Two implementations of one contract: [`ApiClient`] talks to the live
//! provider REST API, [`MockSource`] reads the bundled JSON fixtures.
//! Both return the same [`ApiResponse`] shape, so the catalog never
//! sniffs response shapes — the source is picked once, by mode, at the
//! boundary.
//!
//! List endpoints wrap the collection in an envelope field named after
//! the resource (`{"servers": [...]}`); single fetches use the singular
//! field (`{"server": {...}}`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use sd_store::ResourceKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("fixture {path} unreadable: {message}")]
    Fixture { path: String, message: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response envelope missing field {0}")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A response from either source: HTTP status (fixtures always report
/// 200) plus the parsed JSON envelope.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// One data source for resource collections. The catalog holds one
/// source per mode and dispatches on the active mode.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn fetch_list(&self, kind: ResourceKind) -> Result<ApiResponse>;

    async fn fetch_one(&self, kind: ResourceKind, id: i64) -> Result<ApiResponse>;

    /// Endpoint string for call bookkeeping.
    fn endpoint(&self, kind: ResourceKind) -> String;
}

/// Pull the typed collection out of a list envelope.
pub fn extract_list<T: DeserializeOwned>(kind: ResourceKind, body: &Value) -> Result<Vec<T>> {
    let field = body
        .get(kind.envelope_field())
        .ok_or(Error::MissingField(kind.envelope_field()))?;
    Ok(serde_json::from_value(field.clone())?)
}

/// Pull a single typed record out of a get-one envelope.
pub fn extract_one<T: DeserializeOwned>(kind: ResourceKind, body: &Value) -> Result<T> {
    let field = body
        .get(kind.singular_field())
        .ok_or(Error::MissingField(kind.singular_field()))?;
    Ok(serde_json::from_value(field.clone())?)
}

// ── Live client ─────────────────────────────────────────────────────

/// Client for the live provider REST API, one bearer token per client.
#[derive(Clone)]
pub struct ApiClient {
    base: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: impl Into<String>, token: Option<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    async fn get_json(&self, endpoint: String) -> Result<ApiResponse> {
        let mut req = self.http.get(&endpoint);
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            body: resp.json().await?,
        })
    }
}

#[async_trait]
impl ResourceSource for ApiClient {
    async fn fetch_list(&self, kind: ResourceKind) -> Result<ApiResponse> {
        self.get_json(self.url(kind.api_path())).await
    }

    async fn fetch_one(&self, kind: ResourceKind, id: i64) -> Result<ApiResponse> {
        self.get_json(self.url(&format!("{}/{id}", kind.api_path())))
            .await
    }

    fn endpoint(&self, kind: ResourceKind) -> String {
        self.url(kind.api_path())
    }
}

// ── Mock fixtures ───────────────────────────────────────────────────

/// Reads static fixtures from `<dir>/<resource>.json`. Matches the live
/// client's envelope shape, so the catalog treats both identically.
#[derive(Clone)]
pub struct MockSource {
    dir: PathBuf,
}

impl MockSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn fixture_path(&self, kind: ResourceKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.api_path()))
    }

    async fn load(&self, kind: ResourceKind) -> Result<Value> {
        let path = self.fixture_path(kind);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Fixture {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl ResourceSource for MockSource {
    async fn fetch_list(&self, kind: ResourceKind) -> Result<ApiResponse> {
        Ok(ApiResponse {
            status: 200,
            body: self.load(kind).await?,
        })
    }

    /// Fixtures only ship list files; a single fetch scans the list for
    /// the matching id and rewraps it under the singular field.
    async fn fetch_one(&self, kind: ResourceKind, id: i64) -> Result<ApiResponse> {
        let body = self.load(kind).await?;
        let items: Vec<Value> = extract_list(kind, &body)?;
        let found = items
            .into_iter()
            .find(|item| item.get("id").and_then(Value::as_i64) == Some(id))
            .ok_or(Error::MissingField(kind.singular_field()))?;
        Ok(ApiResponse {
            status: 200,
            body: serde_json::json!({ kind.singular_field(): found }),
        })
    }

    fn endpoint(&self, kind: ResourceKind) -> String {
        format!("/assets/mock/{}.json", kind.api_path())
    }
}
