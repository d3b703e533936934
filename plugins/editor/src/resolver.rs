//! Resource lookup: turning references into content

use async_trait::async_trait;
use confedit_core::{ConfEditError, LookupSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::reference::ResourceReference;
use crate::{EditorError, EditorResult};

/// Endpoint resolving a resource by environment, zone and name
pub const BY_NAME_VERSION_PATH: &str = "/api/admin/resource/detail";

/// Endpoint resolving a fully qualified reference picked in the dialog
pub const DETAIL_PATH: &str = "/api/admin/resource/version/detail";

/// Resolves resource references to their content.
///
/// Failures come back as `Err`, never as panics, so callers can always
/// recover.
#[async_trait]
pub trait ResourceResolver: Send + Sync {
    /// Look up a resource bound to `environment` + `zone` + `name`.
    ///
    /// `name` must already have any `@version` suffix stripped; picking the
    /// version is the lookup service's job.
    async fn resolve_by_name_version(
        &self,
        environment: &str,
        zone: &str,
        name: &str,
    ) -> EditorResult<String>;

    /// Fetch the content behind a reference selected in the dialog
    async fn resolve_detail(&self, reference: &str) -> EditorResult<String>;
}

/// `{code, msg, data}` envelope returned by the lookup service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl LookupResponse {
    /// Successful response carrying `content`
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            code: 0,
            msg: String::new(),
            data: serde_json::Value::String(content.into()),
        }
    }

    /// Failed response with a non-zero code
    pub fn failed(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: serde_json::Value::Null,
        }
    }

    /// Extract the content payload, mapping a non-zero code to `NotFound`.
    ///
    /// `data` is either the content itself or an object with a `content`
    /// field.
    pub fn into_content(self) -> EditorResult<String> {
        if self.code != 0 {
            return Err(EditorError::NotFound {
                code: self.code,
                message: self.msg,
            });
        }

        match self.data {
            serde_json::Value::String(content) => Ok(content),
            serde_json::Value::Object(mut fields) => match fields.remove("content") {
                Some(serde_json::Value::String(content)) => Ok(content),
                _ => Err(EditorError::Transport(
                    "lookup response object has no string `content` field".to_string(),
                )),
            },
            other => Err(EditorError::Transport(format!(
                "unexpected lookup payload: {}",
                other
            ))),
        }
    }
}

/// Resolver backed by the HTTP lookup service
#[derive(Debug, Clone)]
pub struct HttpResourceResolver {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpResourceResolver {
    /// Create a resolver from lookup settings
    pub fn new(settings: &LookupSettings) -> EditorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| EditorError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, path: &str, query: &[(&str, &str)]) -> EditorResult<String> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {} {:?}", url, query);

        let mut request = self.client.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EditorError::Transport(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EditorError::Transport(format!(
                "GET {} returned HTTP {}",
                url, status
            )));
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| EditorError::Transport(format!("Invalid lookup response: {}", e)))?;

        body.into_content()
    }
}

#[async_trait]
impl ResourceResolver for HttpResourceResolver {
    async fn resolve_by_name_version(
        &self,
        environment: &str,
        zone: &str,
        name: &str,
    ) -> EditorResult<String> {
        self.fetch(
            BY_NAME_VERSION_PATH,
            &[("env", environment), ("zoneCode", zone), ("name", name)],
        )
        .await
    }

    async fn resolve_detail(&self, reference: &str) -> EditorResult<String> {
        self.fetch(DETAIL_PATH, &[("resource", reference)]).await
    }
}

/// In-memory resolver over a fixed table of resources
#[derive(Debug, Default)]
pub struct StaticResourceResolver {
    by_name: HashMap<String, String>,
    by_reference: HashMap<String, String>,
    lookups: AtomicUsize,
}

impl StaticResourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content under a reference.
    ///
    /// The content is reachable through the full reference and through the
    /// bare name; a later registration of the same name wins.
    pub fn insert(&mut self, reference: &str, content: impl Into<String>) -> EditorResult<()> {
        let parsed = ResourceReference::parse(reference)?;
        let content = content.into();
        self.by_name
            .insert(parsed.name().to_string(), content.clone());
        self.by_reference
            .insert(parsed.as_str().to_string(), content);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_resource(
        mut self,
        reference: &str,
        content: impl Into<String>,
    ) -> EditorResult<Self> {
        self.insert(reference, content)?;
        Ok(self)
    }

    /// Build a resolver from a JSON object mapping references to content.
    ///
    /// A malformed table is a configuration problem, not a lookup failure.
    pub fn from_json(json: &str) -> confedit_core::Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| ConfEditError::config(format!("Invalid resource table: {}", e)))?;

        let mut resolver = Self::new();
        for (reference, content) in entries {
            resolver.insert(&reference, content).map_err(|e| {
                ConfEditError::config(format!("Invalid resource table entry: {}", e))
            })?;
        }
        Ok(resolver)
    }

    /// Number of lookups served so far, hits and misses alike
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn not_found(what: &str) -> EditorError {
        EditorError::NotFound {
            code: 1,
            message: format!("resource {} not found", what),
        }
    }
}

#[async_trait]
impl ResourceResolver for StaticResourceResolver {
    async fn resolve_by_name_version(
        &self,
        _environment: &str,
        _zone: &str,
        name: &str,
    ) -> EditorResult<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))
    }

    async fn resolve_detail(&self, reference: &str) -> EditorResult<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.by_reference
            .get(reference)
            .or_else(|| self.by_name.get(reference))
            .cloned()
            .ok_or_else(|| Self::not_found(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_response_success() {
        let response: LookupResponse =
            serde_json::from_str(r#"{"code":0,"data":"timeout=30"}"#).unwrap();
        assert_eq!(response.into_content().unwrap(), "timeout=30");

        let response: LookupResponse =
            serde_json::from_str(r#"{"code":0,"data":{"content":"a=1","version":2}}"#).unwrap();
        assert_eq!(response.into_content().unwrap(), "a=1");
    }

    #[test]
    fn test_lookup_response_failure_code() {
        let response: LookupResponse = serde_json::from_str(r#"{"code":1}"#).unwrap();
        match response.into_content() {
            Err(EditorError::NotFound { code, .. }) => assert_eq!(code, 1),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_response_bad_payload() {
        let response = LookupResponse {
            code: 0,
            msg: String::new(),
            data: serde_json::json!(42),
        };
        assert!(matches!(
            response.into_content(),
            Err(EditorError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticResourceResolver::new()
            .with_resource("cache.conf@v2", "timeout=30")
            .unwrap();

        assert_eq!(
            resolver.resolve_detail("cache.conf@v2").await.unwrap(),
            "timeout=30"
        );
        assert_eq!(
            resolver
                .resolve_by_name_version("prod", "z1", "cache.conf")
                .await
                .unwrap(),
            "timeout=30"
        );
        assert!(resolver.resolve_detail("missing.conf").await.is_err());
        assert_eq!(resolver.lookup_count(), 3);
    }

    #[test]
    fn test_static_resolver_from_json() {
        let resolver =
            StaticResourceResolver::from_json(r#"{"redis@3": "addr=10.0.0.1:6379"}"#).unwrap();
        assert_eq!(resolver.by_name.get("redis").unwrap(), "addr=10.0.0.1:6379");
    }

    #[test]
    fn test_malformed_resource_table_is_config_error() {
        for json in [r#"{"": "x"}"#, "not json", r#"["redis@3"]"#] {
            let result = StaticResourceResolver::from_json(json);
            assert!(
                matches!(result, Err(ConfEditError::Config(_))),
                "{json:?} should be a config error"
            );
            assert!(!result.unwrap_err().is_recoverable());
        }
    }

    #[test]
    fn test_http_resolver_trims_base_url() {
        let settings = LookupSettings {
            base_url: "http://127.0.0.1:9/".to_string(),
            ..LookupSettings::default()
        };
        let resolver = HttpResourceResolver::new(&settings).unwrap();
        assert_eq!(resolver.base_url(), "http://127.0.0.1:9");
    }
}
