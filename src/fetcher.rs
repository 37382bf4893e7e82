use std::time::Duration;

use log::{debug, warn};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};
use thiserror::Error;
use tokio::time::{sleep, sleep_until, Instant};
use typed_builder::TypedBuilder;

use crate::error::ConfigError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[serde_as]
#[derive(Clone, Debug, Deserialize, TypedBuilder)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Total number of attempts per URL, including the first one.
    #[builder(default = 3)]
    pub attempts: u32,
    /// Sleep before retry `n` is `base_delay * n`.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[builder(default = Duration::from_secs(2))]
    pub base_delay: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[builder(default = Duration::from_secs(30))]
    pub timeout: Duration,
    /// Minimum time between the starts of two consecutive requests.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[builder(default = Duration::from_secs(1))]
    pub min_interval: Duration,
    #[builder(default = DEFAULT_USER_AGENT.to_owned(), setter(into))]
    pub user_agent: String,
}
impl Default for HttpConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Error)]
#[error("Gave up fetching {url} after {attempts} attempts (last status: {last_status:?})")]
pub struct FetchError {
    pub url: Url,
    pub attempts: u32,
    /// `None` when no attempt got as far as an HTTP response.
    pub last_status: Option<StatusCode>,
}

/// Sequential HTTP client with retries and a politeness throttle.
pub struct Fetcher {
    client: reqwest::Client,
    config: HttpConfig,
    last_start: Option<Instant>,
}

impl Fetcher {
    pub fn new(config: HttpConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            last_start: None,
        })
    }

    pub async fn fetch(&mut self, url: &Url) -> Result<String, FetchError> {
        let attempts = self.config.attempts.max(1);
        let mut last_status = None;
        for attempt in 1..=attempts {
            self.throttle().await;
            debug!("GET {url} (attempt {attempt}/{attempts})");
            match self.client.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    last_status = Some(response.status());
                    match response.text().await {
                        Ok(body) => return Ok(body),
                        Err(e) => warn!("Failed to read the body of {url}: {e}"),
                    }
                }
                Ok(response) => {
                    warn!("{url} responded with {}", response.status());
                    last_status = Some(response.status());
                }
                Err(e) => warn!("Request to {url} failed: {e}"),
            }
            if attempt < attempts {
                sleep(self.retry_delay(attempt)).await;
            }
        }
        Err(FetchError {
            url: url.clone(),
            attempts,
            last_status,
        })
    }

    /// Sleep after the failed attempt `attempt` (1-based).
    fn retry_delay(&self, attempt: u32) -> Duration {
        self.config.base_delay.saturating_mul(attempt)
    }

    /// An interval too large to represent as a deadline disables the throttle.
    async fn throttle(&mut self) {
        if let Some(deadline) = self
            .last_start
            .and_then(|last_start| last_start.checked_add(self.config.min_interval))
        {
            sleep_until(deadline).await;
        }
        self.last_start = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::{StatusCode, Url};
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::{Fetcher, HttpConfig};
    use crate::error::ConfigError;

    fn fast_config() -> HttpConfig {
        HttpConfig::builder()
            .base_delay(Duration::from_millis(1))
            .min_interval(Duration::ZERO)
            .timeout(Duration::from_secs(5))
            .user_agent("mhdata-test")
            .build()
    }

    fn url(server: &MockServer, route: &str) -> Url {
        Url::parse(&format!("{}{route}", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn gives_up_after_all_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/skills/guard"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let mut fetcher = Fetcher::new(fast_config()).unwrap();
        let error = fetcher
            .fetch(&url(&server, "/skills/guard"))
            .await
            .unwrap_err();
        assert_eq!(error.attempts, 3);
        assert_eq!(error.last_status, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(error.url.path().ends_with("/skills/guard"));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/skills/guard"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/skills/guard"))
            .and(header("user-agent", "mhdata-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let mut fetcher = Fetcher::new(fast_config()).unwrap();
        let body = fetcher.fetch(&url(&server, "/skills/guard")).await.unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn network_failure_has_no_status() {
        // Nothing listens on port 1.
        let target = Url::parse("http://127.0.0.1:1/gone").unwrap();
        let mut fetcher = Fetcher::new(
            HttpConfig::builder()
                .attempts(2)
                .base_delay(Duration::from_millis(1))
                .min_interval(Duration::ZERO)
                .build(),
        )
        .unwrap();
        let error = fetcher.fetch(&target).await.unwrap_err();
        assert_eq!(error.attempts, 2);
        assert_eq!(error.last_status, None);
    }

    #[tokio::test]
    async fn throttles_consecutive_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut fetcher = Fetcher::new(
            HttpConfig::builder()
                .min_interval(Duration::from_millis(100))
                .build(),
        )
        .unwrap();
        let start = std::time::Instant::now();
        fetcher.fetch(&url(&server, "/a")).await.unwrap();
        fetcher.fetch(&url(&server, "/b")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn invalid_user_agent_is_a_config_error() {
        let result = Fetcher::new(HttpConfig::builder().user_agent("bad\nagent").build());
        assert!(matches!(result, Err(ConfigError::Client(_))));
    }

    #[test]
    fn huge_delays_saturate() {
        let fetcher = Fetcher::new(
            HttpConfig::builder()
                .base_delay(Duration::MAX)
                .build(),
        )
        .unwrap();
        assert_eq!(fetcher.retry_delay(3), Duration::MAX);
        assert_eq!(fast_fetcher().retry_delay(3), Duration::from_millis(3));
    }

    #[tokio::test]
    async fn unrepresentable_interval_does_not_panic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut fetcher = Fetcher::new(
            HttpConfig::builder()
                .min_interval(Duration::MAX)
                .build(),
        )
        .unwrap();
        fetcher.fetch(&url(&server, "/a")).await.unwrap();
        fetcher.fetch(&url(&server, "/b")).await.unwrap();
    }

    fn fast_fetcher() -> Fetcher {
        Fetcher::new(fast_config()).unwrap()
    }

    #[test]
    fn durations_are_milliseconds() {
        let config: HttpConfig = toml::from_str("attempts = 5\nbase_delay = 250\n").unwrap();
        assert_eq!(config.attempts, 5);
        assert_eq!(config.base_delay, Duration::from_millis(250));
        assert_eq!(config.min_interval, HttpConfig::default().min_interval);
    }
}
