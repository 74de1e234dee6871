use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::{Error, Result};

pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Transport seam for talking to the daemon's HTTP API.
///
/// Paths are relative to the daemon's base URL (e.g. `/findFile`).
/// Implementations report non-success statuses as [`Error::RequestFailed`]
/// before yielding any body bytes.
///
/// - [`ReqwestClient`]: production implementation
/// - in-process mocks in tests
pub trait HttpClient: Send + Sync {
    /// POST a JSON body and return the raw response body as a byte stream.
    fn post_stream(
        &self,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes>>>> + Send;

    /// Upload the file at `file` as the raw request body, with its length as
    /// `Content-Length`, and parse the JSON response.
    fn post_file(&self, path: &str, file: &Path) -> impl Future<Output = Result<Value>> + Send;

    /// POST a JSON body and parse the whole response as JSON.
    fn post_json(&self, path: &str, body: &Value) -> impl Future<Output = Result<Value>> + Send {
        async move {
            let mut stream = self.post_stream(path, body).await?;
            let mut buf = Vec::new();
            while let Some(chunk) = stream.next().await {
                buf.extend_from_slice(&chunk?);
            }
            Ok(serde_json::from_slice(&buf)?)
        }
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use reqwest::StatusCode;
    use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};

    use super::*;

    /// Production HTTP client built on reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client:   reqwest::Client,
        base_url: String,
        headers:  HeaderMap,
    }

    impl ReqwestClient {
        pub fn new(base_url: impl Into<String>) -> Result<Self> {
            let client = reqwest::Client::builder().build().map_err(Error::transport)?;
            Ok(Self {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                headers: HeaderMap::new(),
            })
        }

        /// Extra headers sent with every request, e.g. API credentials.
        pub fn with_headers<'a>(
            mut self,
            headers: impl IntoIterator<Item = (&'a String, &'a String)>,
        ) -> Result<Self> {
            for (name, value) in headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| Error::InvalidHeader(name.clone()))?;
                let value =
                    HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.to_string()))?;
                self.headers.insert(name, value);
            }
            Ok(self)
        }

        pub fn base_url(&self) -> &str { &self.base_url }

        fn url(&self, path: &str) -> String {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::RequestFailed {
            status: status.as_u16(),
            body,
        })
    }

    impl HttpClient for ReqwestClient {
        async fn post_stream(&self, path: &str, body: &Value) -> Result<BoxStream<'static, Result<Bytes>>> {
            let response = self
                .client
                .post(self.url(path))
                .headers(self.headers.clone())
                .json(body)
                .send()
                .await
                .map_err(Error::transport)?;
            let response = check_status(response).await?;
            let stream = response.bytes_stream().map(|chunk| chunk.map_err(Error::transport));
            Ok(Box::pin(stream))
        }

        async fn post_file(&self, path: &str, file: &Path) -> Result<Value> {
            let io_err = |source| Error::Io {
                path: file.to_path_buf(),
                source,
            };
            let handle = tokio::fs::File::open(file).await.map_err(io_err)?;
            let len = handle.metadata().await.map_err(io_err)?.len();

            let response = self
                .client
                .post(self.url(path))
                .headers(self.headers.clone())
                .header(CONTENT_LENGTH, len)
                .body(reqwest::Body::from(handle))
                .send()
                .await
                .map_err(Error::transport)?;
            let response = check_status(response).await?;
            response.json().await.map_err(Error::transport)
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
