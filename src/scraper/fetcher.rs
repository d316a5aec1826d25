use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, ClientBuilder, Response};
use std::time::Duration;
use url::Url;

use super::document::RawDocument;
use super::ExtractorConfig;
use crate::error::FetchError;

/// Media types accepted as HTML-like content.
const HTML_LIKE: &[&str] = &["text/html", "application/xhtml+xml", "text/plain"];

/// Retrieves one page per call. Cheap to clone: the underlying client is
/// reference counted and the limits are plain values.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    max_redirects: usize,
    max_body_bytes: usize,
}

impl Fetcher {
    pub fn new(config: &ExtractorConfig) -> Result<Self, FetchError> {
        let max_redirects = config.max_redirects;

        // `previous` holds every URL visited so far, so hop N sees N entries.
        let redirect_policy = Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                attempt.error(format!("redirect limit of {max_redirects} exceeded"))
            } else {
                attempt.follow()
            }
        });

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(redirect_policy)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout,
            max_redirects,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Fetch `url`, following redirects, and return the raw body.
    ///
    /// The URL is validated before anything touches the network. The whole
    /// sequence (connect, redirect hops, body) shares one time budget.
    pub async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        let url = validate_url(url)?;

        match tokio::time::timeout(self.timeout, self.fetch_unbounded(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }

    async fn fetch_unbounded(&self, url: Url) -> Result<RawDocument, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpError {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .trim()
            .to_string();

        if !is_html_like(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes as u64 {
                return Err(FetchError::ResponseTooLarge {
                    limit: self.max_body_bytes,
                });
            }
        }

        let final_url = response.url().clone();
        let body = self.read_capped(response).await?;

        Ok(RawDocument {
            body,
            content_type,
            final_url,
            status: status.as_u16(),
        })
    }

    /// Stream the body, failing as soon as the running total would pass the cap.
    ///
    /// The cap bounds what is kept, not what is read: hyper may already hold
    /// one chunk past the limit in its buffer when the check trips.
    async fn read_capped(&self, mut response: Response) -> Result<Vec<u8>, FetchError> {
        let hint = response.content_length().unwrap_or(0) as usize;
        let mut body = Vec::with_capacity(hint.min(self.max_body_bytes));

        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::ResponseTooLarge {
                    limit: self.max_body_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_redirect() {
            FetchError::TooManyRedirects(self.max_redirects)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Accept only absolute http(s) URLs that name a host.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::InvalidUrl(format!("{raw}: missing host")));
    }

    Ok(url)
}

/// A missing content type is given the benefit of the doubt.
pub fn is_html_like(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || HTML_LIKE.contains(&mime.as_str())
}
