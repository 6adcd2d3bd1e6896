use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::{Product, ProductDraft, ProductId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Validation,
    Parse,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("invalid response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Decode { .. } => ErrorKind::Parse,
            _ => ErrorKind::Network,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Remote product collection. Implementations must not keep any view of the
/// catalog themselves; the dashboard folds results into its own records.
pub trait CatalogApi {
    fn list_all(&self) -> impl Future<Output = Result<Vec<Product>, CatalogError>>;

    fn create(&self, draft: &ProductDraft) -> impl Future<Output = Result<Product, CatalogError>>;

    fn update(
        &self,
        id: ProductId,
        patch: &ProductDraft,
    ) -> impl Future<Output = Result<(), CatalogError>>;
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: super::DEFAULT_BASE_URL.to_string(),
            timeout_seconds: None,
            proxy: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(options: &ClientOptions) -> Result<Self, CatalogError> {
        let base_url = normalize_base_url(&options.base_url)?;
        let http = build_http_client(options.proxy.as_deref(), options.timeout_seconds)?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl CatalogApi for HttpCatalogClient {
    async fn list_all(&self) -> Result<Vec<Product>, CatalogError> {
        let url = self.endpoint("products");
        debug!(method = "GET", %url, "loading catalog");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| CatalogError::Request { source })?;

        let status = response.status();
        debug!(status = status.as_u16(), "catalog response");
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: "failed to fetch products".to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| CatalogError::Request { source })?;
        serde_json::from_str(&body).map_err(|source| CatalogError::Decode { source })
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, CatalogError> {
        let url = self.endpoint("products/");
        debug!(method = "POST", %url, title = %draft.title, "creating product");
        let response = self
            .http
            .post(&url)
            .json(draft)
            .send()
            .await
            .map_err(|source| CatalogError::Request { source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| CatalogError::Request { source })?;
        debug!(status = status.as_u16(), "create response");

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "create rejected");
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: error_message_from_body(status.as_u16(), &body),
            });
        }

        serde_json::from_str(&body).map_err(|source| CatalogError::Decode { source })
    }

    async fn update(&self, id: ProductId, patch: &ProductDraft) -> Result<(), CatalogError> {
        let url = self.endpoint(&format!("products/{id}"));
        debug!(method = "PUT", %url, "updating product");
        let response = self
            .http
            .put(&url)
            .json(patch)
            .send()
            .await
            .map_err(|source| CatalogError::Request { source })?;

        let status = response.status();
        debug!(status = status.as_u16(), "update response");
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: "failed to update product".to_string(),
            });
        }
        Ok(())
    }
}

fn normalize_base_url(raw: &str) -> Result<String, CatalogError> {
    let trimmed = raw.trim();
    match reqwest::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(trimmed.trim_end_matches('/').to_string())
        }
        _ => Err(CatalogError::InvalidBaseUrl {
            url: raw.to_string(),
        }),
    }
}

fn build_http_client(
    proxy: Option<&str>,
    timeout_seconds: Option<u64>,
) -> Result<reqwest::Client, CatalogError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!(
            "catalog-dash/",
            env!("CARGO_PKG_VERSION")
        )),
    );

    let mut builder = reqwest::Client::builder().default_headers(headers);

    // zero means "wait forever", same as leaving it unset
    if let Some(secs) = timeout_seconds.filter(|s| *s > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| CatalogError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| CatalogError::HttpClientBuild { source: e })
}

/// A JSON `message` (string, or list of strings) wins; a body that is not JSON
/// is used verbatim; otherwise the status code is reported.
pub fn error_message_from_body(status: u16, body: &str) -> String {
    let generic = || format!("HTTP error! status: {status}");
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => {
            let message = match value.get("message") {
                Some(serde_json::Value::String(s)) => s.trim().to_string(),
                Some(serde_json::Value::Array(items)) => items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => String::new(),
            };
            if message.is_empty() {
                generic()
            } else {
                message
            }
        }
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => generic(),
    }
}
