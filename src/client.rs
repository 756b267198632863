use crate::{config::Settings, resolver::EnvironmentResolver};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error("network: {0}")]
    Network(#[source] reqwest::Error),
    #[error("upstream error {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("invalid json from upstream: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("invalid header `{0}`")]
    InvalidHeader(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Applied after the defaults, so they may override them
    pub headers: BTreeMap<String, String>,
    /// Falls back to [`Settings::http_timeout_ms`]
    pub timeout_ms: Option<u64>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self { method: Method::Post, body: Some(body), ..Self::default() }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    pub http: Client,
    pub resolver: EnvironmentResolver,
    access_token: Option<String>,
    language: Option<String>,
    default_timeout_ms: u64,
}

impl ApiClient {
    pub fn new(resolver: EnvironmentResolver, settings: &Settings) -> Result<Self, ApiError> {
        // no client-level timeout; each call races its own timer
        let http = Client::builder().build().map_err(ApiError::Network)?;
        Ok(Self {
            http,
            resolver,
            access_token: settings.bearer_token.clone(),
            language: settings.language.clone(),
            default_timeout_ms: settings.http_timeout_ms,
        })
    }

    pub fn set_access_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    /// Issue one JSON request against the active environment.
    ///
    /// The base URL is captured when the call starts; a later environment
    /// switch does not retarget it. Dropping the returned future cancels the
    /// request.
    pub async fn api_call(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let url = join_url(&self.resolver.api_base_url(), endpoint);
        let after_ms = options.timeout_ms.unwrap_or(self.default_timeout_ms);
        let headers = self.headers(&options)?;

        let mut req = self.http.request(options.method.into(), &url).headers(headers);
        if let Some(body) = &options.body {
            req = req.json(body);
        }

        tracing::debug!(method = ?options.method, %url, timeout_ms = after_ms, "api call");
        let exchange = async move {
            let resp = req.send().await.map_err(ApiError::Network)?;
            let status = resp.status();
            let bytes = resp.bytes().await.map_err(ApiError::Network)?;
            Ok::<_, ApiError>((status, bytes))
        };
        let (status, bytes) = tokio::time::timeout(Duration::from_millis(after_ms), exchange)
            .await
            .map_err(|_| ApiError::Timeout { after_ms })??;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).to_string();
            tracing::debug!(%url, %status, "upstream returned error status");
            return Err(ApiError::Http { status, body });
        }
        serde_json::from_slice(&bytes).map_err(ApiError::Parse)
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.api_call(endpoint, RequestOptions::get()).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value, ApiError> {
        self.api_call(endpoint, RequestOptions::post(body)).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let v = self.get(endpoint).await?;
        serde_json::from_value(v).map_err(ApiError::Parse)
    }

    fn headers(&self, options: &RequestOptions) -> Result<HeaderMap, ApiError> {
        let mut h = HeaderMap::new();
        h.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if options.body.is_some() {
            h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if let Some(t) = &self.access_token {
            h.insert(AUTHORIZATION, header_value(&format!("Bearer {t}"), "authorization")?);
        }
        if let Some(lang) = &self.language {
            h.insert(ACCEPT_LANGUAGE, header_value(lang, "accept-language")?);
        }
        for (k, v) in &options.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(k.clone()))?;
            h.insert(name, header_value(v, k)?);
        }
        Ok(h)
    }
}

fn header_value(v: &str, name: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(v).map_err(|_| ApiError::InvalidHeader(name.to_string()))
}

/// Exactly one `/` between base and endpoint.
pub fn join_url(base: &str, endpoint: &str) -> String {
    let base = base.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    if endpoint.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{endpoint}")
    }
}
