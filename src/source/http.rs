use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::data::{ErrorBody, PageResult};
use crate::error::{RankingError, Result};
use crate::genre::Genre;
use crate::source::RankingSource;
use crate::utils;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Upper bound of [`ConfigBuilder::max_retries`]
pub const MAX_RETRIES: u32 = 3;

/// Preset deployments of the ranking API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Production,
}

impl Deployment {
    pub fn host(&self) -> &str {
        match self {
            Deployment::Local => "localhost",
            Deployment::Production => "lz-test-one.vercel.app",
        }
    }

    pub fn base_url(&self) -> Url {
        let url = match self {
            Deployment::Local => "http://localhost:3000",
            Deployment::Production => "https://lz-test-one.vercel.app",
        };
        Url::parse(url).expect("preset url is valid")
    }

    pub fn lookup(host: &str) -> Option<Self> {
        [Deployment::Local, Deployment::Production]
            .into_iter()
            .find(|deployment| deployment.host() == host)
    }
}

/// HTTP source config
#[derive(Debug, Clone)]
pub struct Config {
    base_url: Url,
    timeout: Duration,
    max_retries: u32,
}

impl Config {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn create_header(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&utils::UserAgent::Bot.value())?,
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    base_url: Url,
    timeout: Duration,
    max_retries: u32,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder from preset
    pub fn new(deployment: Deployment) -> Self {
        Self {
            base_url: deployment.base_url(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: 0,
        }
    }

    /// Create a new ConfigBuilder from custom url
    pub fn custom(url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(url)?,
            ..Self::new(Deployment::Local)
        })
    }

    pub fn base_url(&mut self, base_url: Url) -> &mut Self {
        self.base_url = base_url;
        self
    }

    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Retries of transient failures per page, 0 disables them. Capped at [`MAX_RETRIES`].
    pub fn max_retries(&mut self, max_retries: u32) -> &mut Self {
        self.max_retries = max_retries.min(MAX_RETRIES);
        self
    }

    pub fn build(&self) -> Config {
        Config {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            max_retries: self.max_retries,
        }
    }
}

/// Ranking API client
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    config: Config,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `{base_url}/api/comics/{genre}?page={page}`, keeping any path prefix of the base
    fn compose_page_url(&self, genre: Genre, page: u32) -> Result<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RankingError::BaseUrl(self.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "comics", genre.as_str()]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn fetch_raw(&self, url: Url) -> Result<(StatusCode, String)> {
        let headers = self.config.create_header()?;
        let res = self.client.get(url).headers(headers).send().await?;
        let status = res.status();
        Ok((status, res.text().await?))
    }

    async fn fetch_once(&self, genre: Genre, page: u32) -> Result<PageResult> {
        let url = self.compose_page_url(genre, page)?;
        tracing::debug!(%url, "fetching ranking page");
        let (status, body) = self.fetch_raw(url).await?;
        parse_page(status, &body)
    }
}

impl RankingSource for Client {
    async fn fetch_page(
        &self,
        genre: Genre,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<PageResult> {
        if page < 1 {
            return Err(RankingError::InvalidPage(page));
        }

        let mut attempt = 0;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RankingError::Cancelled),
                result = self.fetch_once(genre, page) => result,
            };

            match result {
                Err(e) if attempt < self.config.max_retries && e.is_transient() => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(%genre, page, attempt, ?delay, error = %e, "retrying ranking page");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(RankingError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// 1s, 2s, 4s, ... capped at 30s
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000u64.saturating_mul(1 << attempt.min(16))).min(MAX_BACKOFF)
}

/// Turn a raw API answer into a page
fn parse_page(status: StatusCode, body: &str) -> Result<PageResult> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown").to_string());
        return Err(RankingError::Status {
            status: status.as_u16(),
            message,
        });
    }

    if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(body) {
        return Err(RankingError::Api(error));
    }

    let deserializer = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(deserializer).map_err(|e| RankingError::Json {
        path: e.path().to_string(),
        source: e.into_inner(),
    })
}

#[cfg(test)]
mod test {
    #[cfg(feature = "server")]
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_compose_page_url() {
        let config = ConfigBuilder::new(Deployment::Production).build();
        let client = Client::new(config).unwrap();
        let url = client.compose_page_url(Genre::Drama, 3).unwrap();
        assert_eq!(
            url.as_str(),
            "https://lz-test-one.vercel.app/api/comics/drama?page=3"
        );
    }

    #[test]
    fn test_compose_page_url_keeps_prefix() {
        for base in ["https://example.com/ranking/", "https://example.com/ranking"] {
            let config = ConfigBuilder::custom(base).unwrap().build();
            let client = Client::new(config).unwrap();
            let url = client.compose_page_url(Genre::Drama, 2).unwrap();
            assert_eq!(
                url.as_str(),
                "https://example.com/ranking/api/comics/drama?page=2"
            );
        }
    }

    #[test]
    fn test_compose_page_url_rejects_opaque_base() {
        let config = ConfigBuilder::custom("mailto:ranking@example.com")
            .unwrap()
            .build();
        let client = Client::new(config).unwrap();
        let err = client.compose_page_url(Genre::Romance, 1).unwrap_err();
        assert!(matches!(err, RankingError::BaseUrl(_)));
    }

    #[test]
    fn test_max_retries_is_capped() {
        let config = ConfigBuilder::new(Deployment::Local).max_retries(10).build();
        assert_eq!(config.max_retries, MAX_RETRIES);

        let config = ConfigBuilder::new(Deployment::Local).max_retries(2).build();
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_deployment_lookup() {
        assert_eq!(
            Deployment::lookup("lz-test-one.vercel.app"),
            Some(Deployment::Production)
        );
        assert_eq!(Deployment::lookup("example.com"), None);
    }

    #[test]
    fn test_parse_success() {
        let page = parse_page(
            StatusCode::OK,
            r#"{"hasNext": false, "count": 0, "data": []}"#,
        )
        .unwrap();
        assert_eq!(page, PageResult::default());
    }

    #[test]
    fn test_parse_status_with_error_body() {
        let err = parse_page(StatusCode::NOT_FOUND, r#"{"error": "Page 9 not found"}"#).unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP error! status: 404: Page 9 not found");
    }

    #[test]
    fn test_parse_status_without_body() {
        let err = parse_page(StatusCode::INTERNAL_SERVER_ERROR, "oops").unwrap_err();
        assert!(matches!(
            err,
            RankingError::Status { status: 500, ref message } if message == "Internal Server Error"
        ));
    }

    #[test]
    fn test_parse_error_body_on_success() {
        let err = parse_page(StatusCode::OK, r#"{"error": "Bad Request"}"#).unwrap_err();
        assert!(matches!(err, RankingError::Api(ref m) if m == "Bad Request"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_parse_malformed_payload() {
        let err = parse_page(
            StatusCode::OK,
            r#"{"hasNext": true, "count": 1, "data": [{"id": "x"}]}"#,
        )
        .unwrap_err();
        match err {
            RankingError::Json { path, .. } => assert_eq!(path, "data[0].id"),
            other => panic!("unexpected error: {other}"),
        }

        let err = parse_page(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, RankingError::Json { .. }));
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(10), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_reject_page_zero() {
        let client = Client::new(ConfigBuilder::new(Deployment::Local).build()).unwrap();
        let err = client
            .fetch_page(Genre::Romance, 0, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::InvalidPage(0)));
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let client = Client::new(ConfigBuilder::new(Deployment::Local).build()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client
            .fetch_page(Genre::Romance, 1, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::Cancelled));
    }

    /// Local API answering every page with `status`, counting requests
    #[cfg(feature = "server")]
    async fn spawn_failing(status: u16) -> (Client, Arc<AtomicUsize>) {
        use axum::{extract::State, routing::get, Json};

        let hits = Arc::new(AtomicUsize::new(0));
        let router = axum::Router::new()
            .route(
                "/api/comics/{genre}",
                get(move |State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let status = axum::http::StatusCode::from_u16(status).unwrap();
                    let body = ErrorBody {
                        error: "down".to_string(),
                    };
                    (status, Json(body))
                }),
            )
            .with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let mut builder = ConfigBuilder::custom(&format!("http://{}", addr)).unwrap();
        builder.max_retries(2);
        (Client::new(builder.build()).unwrap(), hits)
    }

    #[cfg(feature = "server")]
    #[tokio::test]
    async fn test_retry_server_error() {
        let (client, hits) = spawn_failing(503).await;
        let err = client
            .fetch_page(Genre::Romance, 1, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 503: down");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[cfg(feature = "server")]
    #[tokio::test]
    async fn test_no_retry_on_client_error() {
        let (client, hits) = spawn_failing(404).await;
        let err = client
            .fetch_page(Genre::Romance, 1, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[cfg(feature = "server")]
    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let (client, hits) = spawn_failing(503).await;
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            let hits = hits.clone();
            tokio::spawn(async move {
                while hits.load(Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                cancel.cancel();
            })
        };

        let started = std::time::Instant::now();
        let err = client
            .fetch_page(Genre::Romance, 1, &cancel)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, RankingError::Cancelled));
        assert!(started.elapsed() < backoff_delay(0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
