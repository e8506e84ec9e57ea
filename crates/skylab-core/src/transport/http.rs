//! reqwest-backed transport for the studio public API.
//!
//! API calls go to `{url}/api/public/{version}/{endpoint}` with the
//! `X-SLT-API-KEY` and `X-SLT-API-CLIENT` headers. Asset downloads and
//! presigned uploads hit absolute URLs without API headers.

use super::{error_for_status, Header, Method, Transport};
use crate::config::ApiConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// HTTP transport using a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    api_key: Option<String>,
    client_stub: String,
}

impl HttpTransport {
    /// Build a transport from API settings.
    ///
    /// A missing API key is not an error here: the service answers with 401,
    /// which surfaces as `TransportError::InvalidKey` on the first call.
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| TransportError::Unknown {
                status: None,
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        let api_key = config.resolved_api_key();
        if api_key.is_none() {
            tracing::warn!("No API key configured; requests will be rejected by the service");
        }

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            api_key,
            client_stub: config.client_stub.clone(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/public/{}/{}",
            self.base_url,
            self.api_version,
            endpoint.trim_start_matches('/')
        )
    }
}

/// Flatten a JSON object payload into query pairs.
fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    match payload {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn send_error(e: reqwest::Error) -> TransportError {
    if e.is_connect() || e.is_timeout() {
        TransportError::ConnectionRefused(e.to_string())
    } else {
        TransportError::Unknown {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let url = self.endpoint_url(endpoint);
        tracing::debug!("{method} {url}");

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header("Content-Type", "application/json")
            .header("X-SLT-API-CLIENT", &self.client_stub);
        if let Some(key) = &self.api_key {
            builder = builder.header("X-SLT-API-KEY", key);
        }
        if let Some(payload) = payload {
            builder = if method == Method::GET || method == Method::DELETE {
                builder.query(&query_pairs(payload))
            } else {
                builder.json(payload)
            };
        }

        let resp = builder.send().await.map_err(send_error)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(send_error)?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(error_for_status(status.as_u16(), &text));
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| TransportError::Unknown {
            status: Some(status.as_u16()),
            message: format!("Failed to parse response from {endpoint}: {e}"),
        })
    }

    async fn put_bytes(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &[Header],
    ) -> Result<u16, TransportError> {
        let mut builder = self.client.put(url).body(body);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.send().await.map_err(send_error)?;
        let status = resp.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(error_for_status(status.as_u16(), &text))
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let resp = self.client.get(url).send().await.map_err(send_error)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), &text));
        }
        let bytes = resp.bytes().await.map_err(send_error)?;
        Ok(bytes.to_vec())
    }
}
