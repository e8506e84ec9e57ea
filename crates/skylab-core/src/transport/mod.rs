//! HTTP transport abstraction.
//!
//! The transfer pipeline talks to the service only through [`Transport`], so
//! tests can swap in an in-memory fake. [`HttpTransport`] is the reqwest
//! implementation used in production.

mod http;

pub use http::HttpTransport;
pub use reqwest::Method;

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;

/// A request header as (name, value).
pub type Header = (String, String);

/// Trait implemented by every transport.
///
/// Uses `async_trait` because the client holds it as `Arc<dyn Transport>`
/// and shares it across spawned download tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Call an authenticated API endpoint (relative to the API prefix) and
    /// return the parsed JSON body. An empty body parses as `Value::Null`.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<Value, TransportError>;

    /// PUT raw bytes to an absolute URL (presigned upload) with extra headers.
    /// Returns the response status on success.
    async fn put_bytes(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &[Header],
    ) -> Result<u16, TransportError>;

    /// GET raw bytes from an absolute, unauthenticated asset URL.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// Map a non-success HTTP status to a transport error.
pub fn error_for_status(status: u16, body: &str) -> TransportError {
    match status {
        401 | 403 => TransportError::InvalidKey,
        404 => TransportError::InvalidEndpoint(body.to_string()),
        400 => TransportError::BadRequest(body.to_string()),
        429 => TransportError::RateLimited,
        _ => TransportError::Unknown {
            status: Some(status),
            message: body.to_string(),
        },
    }
}
