use std::future::Future;

use bytes::Bytes;
use url::Url;

/// Fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface needed for segment fetching.
/// Implementations return the complete body; a segment is never handed to
/// the sink half-downloaded.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + 'static;

    /// Issue a GET request and buffer the response.
    ///
    /// A non-success status is not an error at this level; the fetcher
    /// decides what to retry. Implementations may skip reading the body of
    /// non-200 responses.
    fn get(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<HttpResponse, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use super::*;

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self, reqwest::Error> {
            let client = reqwest::Client::builder().build()?;
            Ok(Self { client })
        }

        /// Client whose requests time out on their own, independently of
        /// the fetcher's per-attempt bound.
        pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
            let client = reqwest::Client::builder().timeout(timeout).build()?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &Url,
            headers: &[(String, String)],
        ) -> Result<HttpResponse, Self::Error> {
            let mut request = self.client.get(url.clone());

            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            if status != 200 {
                return Ok(HttpResponse::status(status));
            }

            let body = response.bytes().await?;
            Ok(HttpResponse { status, body })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
