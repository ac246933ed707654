//! HTTP gateway.
//!
//! Talks JSON to the bookshelf server using `reqwest`. Idempotent requests
//! (everything except `POST`) are retried with exponential back-off when the
//! server is unreachable or answers with a 5xx status.

use crate::error::{Error, ErrorKind, Result};
use crate::{RemoteGateway, RetryPolicy};
use async_trait::async_trait;
use bookshelf_model::Book;
use exn::{Exn, ResultExt};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Transport default; the server is expected on the local network.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway to a bookshelf server over HTTP.
///
/// # Examples
///
/// ```no_run
/// use bookshelf_remote::{RetryPolicy, RemoteGateway, gateway::HttpGateway};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = HttpGateway::new("http://192.168.1.20:2505", Duration::from_secs(5), RetryPolicy::default())?;
/// let books = gateway.get_all().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base: Url,
    retry: RetryPolicy,
}

impl HttpGateway {
    /// Create a new HTTP gateway.
    ///
    /// # Arguments
    /// * `base_url` - Scheme, host and port of the server (optionally a path prefix)
    /// * `timeout` - Per-request timeout, including reading the response body
    /// * `retry` - Retry policy for idempotent requests
    pub fn new(base_url: impl AsRef<str>, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let base_url = base_url.as_ref();
        let mut base = Url::parse(base_url).or_raise(|| ErrorKind::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            exn::bail!(ErrorKind::InvalidUrl(base_url.to_string()));
        }
        // Without the trailing slash, joining "books" onto "http://host/api"
        // would replace "api" instead of appending to it.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::InvalidUrl(base_url.to_string()))?;
        Ok(Self { client, base, retry })
    }

    /// Gateway with the default timeout and retry policy.
    pub fn with_defaults(base_url: impl AsRef<str>) -> Result<Self> {
        Self::new(base_url, DEFAULT_TIMEOUT, RetryPolicy::default())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base.join(path).or_raise(|| ErrorKind::InvalidUrl(path.to_string()))
    }

    /// Send a request, retrying according to the policy, and return the
    /// successful (2xx) response.
    async fn execute(&self, method: Method, path: &str, body: Option<&Book>) -> Result<Response> {
        let url = self.url(path)?;
        // Creating twice is worse than failing once.
        let attempts = if method == Method::POST { 1 } else { self.retry.attempts() };
        let mut attempt = 1;
        loop {
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(book) = body {
                request = request.json(book);
            }
            let error: Error = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => Exn::from(ErrorKind::Status(response.status().as_u16())),
                Err(err) => Exn::from(err).raise(ErrorKind::Unreachable),
            };
            if attempt >= attempts || !error.is_retryable() {
                tracing::debug!(%method, %url, attempt, ?error, "request failed");
                return Err(error);
            }
            let delay = self.retry.delay(attempt);
            tracing::debug!(%method, %url, attempt, ?delay, ?error, "request failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<&Book>) -> Result<T> {
        let response = self.execute(method, path, body).await?;
        response.json::<T>().await.or_raise(|| ErrorKind::InvalidResponse)
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    fn name(&self) -> &str {
        self.base.as_str()
    }

    async fn get_all(&self) -> Result<Vec<Book>> {
        self.fetch(Method::GET, "books", None).await
    }

    async fn get_all_paged(&self) -> Result<Vec<Book>> {
        self.fetch(Method::GET, "allBooks", None).await
    }

    async fn get(&self, id: i64) -> Result<Book> {
        self.fetch(Method::GET, &format!("book/{id}"), None).await
    }

    async fn create(&self, book: &Book) -> Result<Book> {
        self.fetch(Method::POST, "book", Some(book)).await
    }

    async fn update(&self, book: &Book) -> Result<Book> {
        self.fetch(Method::PUT, &format!("book/{}", book.id), Some(book)).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.execute(Method::DELETE, &format!("book/{id}"), None).await?;
        Ok(())
    }
}
