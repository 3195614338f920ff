use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;

use crate::error::BibAdsError;

pub const DEFAULT_ADS_URL: &str = "http://adsabs.harvard.edu";
const BIB_QUERY_PATH: &str = "/cgi-bin/nph-bib_query?data_type=BIBTEX&bibcode=";

/// Something that turns a Bibcode into BibTeX text.
#[async_trait]
pub trait BibFetcher: Send + Sync {
    async fn fetch(&self, bibcode: &str) -> Result<String, BibAdsError>;
}

/// Fetches entries from the classic ADS `nph-bib_query` endpoint.
#[derive(Debug, Clone)]
pub struct AdsClient {
    client: Client,
    base_url: String,
    retry_for: Option<Duration>,
}

impl Default for AdsClient {
    fn default() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_ADS_URL.to_string(),
            retry_for: None,
        }
    }
}

impl AdsClient {
    /// A client without timeout or retries against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, BibAdsError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Keep retrying transient failures with exponential backoff for at most `max_elapsed`.
    pub fn with_retry(mut self, max_elapsed: Duration) -> Self {
        self.retry_for = Some(max_elapsed);
        self
    }

    /// The query URL for a Bibcode. The Bibcode is appended as-is.
    pub fn query_url(&self, bibcode: &str) -> String {
        format!("{}{}{}", self.base_url, BIB_QUERY_PATH, bibcode)
    }

    async fn fetch_once(&self, url: &str, bibcode: &str) -> Result<String, BibAdsError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BibAdsError::HttpStatus(status));
        }

        let body = response.text().await?;
        extract_entry(&body).ok_or_else(|| BibAdsError::MalformedResponse(bibcode.to_string()))
    }
}

#[async_trait]
impl BibFetcher for AdsClient {
    async fn fetch(&self, bibcode: &str) -> Result<String, BibAdsError> {
        let url = self.query_url(bibcode);
        let url = url.as_str();

        let Some(max_elapsed) = self.retry_for else {
            return self.fetch_once(url, bibcode).await;
        };

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(max_elapsed),
            ..Default::default()
        };

        let operation = move || async move {
            self.fetch_once(url, bibcode).await.map_err(|e| {
                if e.is_transient() {
                    info!("Retrying {} after: {}", bibcode, e);
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        };

        retry(backoff, operation).await
    }
}

/// The first `@`-delimited entry of a response body, up to the next `@`.
pub fn extract_entry(body: &str) -> Option<String> {
    let (_, rest) = body.split_once('@')?;
    let entry = rest.split('@').next().unwrap_or(rest);
    Some(format!("@{}", entry))
}
