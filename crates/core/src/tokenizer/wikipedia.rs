use std::time::Duration;

use reqwest::{blocking::Client, header::USER_AGENT};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{tokenize_text, ArticleTokenizer, Cancellation, TokenizeError};

/// Public MediaWiki API endpoint for English Wikipedia.
pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Upper bound for a single article request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tokenizer that pulls plain-text article extracts from a MediaWiki API.
#[derive(Debug, Clone)]
pub struct WikipediaTokenizer {
    api_url: String,
    timeout: Duration,
}

impl Default for WikipediaTokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_TIMEOUT)
    }
}

impl WikipediaTokenizer {
    /// Create a tokenizer for the given endpoint and request timeout.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            timeout,
        }
    }

    fn request_timeout(&self, cancellation: &Cancellation) -> Duration {
        cancellation
            .remaining()
            .map(|remaining| remaining.min(self.timeout))
            .unwrap_or(self.timeout)
    }
}

impl ArticleTokenizer for WikipediaTokenizer {
    fn fetch_and_tokenize(
        &self,
        title: &str,
        cancellation: &Cancellation,
    ) -> Result<Vec<String>, TokenizeError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TokenizeError::NotFound(String::new()));
        }
        cancellation.check()?;

        // The blocking client owns a runtime, so it is built and dropped on the calling thread.
        let client = Client::builder()
            .timeout(self.request_timeout(cancellation))
            .build()
            .map_err(|err| TokenizeError::Fetch(err.to_string()))?;

        debug!(title, url = %self.api_url, "Fetching article");
        let response = client
            .get(&self.api_url)
            .header(
                USER_AGENT,
                concat!("wikibingo/", env!("CARGO_PKG_VERSION")),
            )
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    TokenizeError::TimedOut
                } else {
                    TokenizeError::Fetch(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!(title, status, "Article request failed");
            return Err(TokenizeError::Fetch(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .map_err(|err| TokenizeError::Fetch(err.to_string()))?;
        cancellation.check()?;

        let tokens = parse_extract(title, &body)?;
        debug!(title, tokens = tokens.len(), "Article tokenized");
        Ok(tokens)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<ApiQuery>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: Option<String>,
}

/// Pull the tokens out of a `formatversion=2` extracts response.
fn parse_extract(title: &str, body: &str) -> Result<Vec<String>, TokenizeError> {
    let decoded: ApiResponse =
        serde_json::from_str(body).map_err(|err| TokenizeError::Fetch(err.to_string()))?;
    let page = decoded
        .query
        .and_then(|query| query.pages.into_iter().next())
        .ok_or_else(|| TokenizeError::NotFound(title.to_string()))?;
    if page.missing || page.invalid {
        return Err(TokenizeError::NotFound(title.to_string()));
    }
    Ok(page
        .extract
        .as_deref()
        .map(tokenize_text)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_article_extract() {
        let body = r#"{
            "batchcomplete": true,
            "query": {
                "pages": [
                    { "pageid": 6678, "ns": 0, "title": "Cat", "extract": "The cat is a small, domesticated Carnivore." }
                ]
            }
        }"#;
        let tokens = parse_extract("cat", body).expect("tokens");
        assert_eq!(
            tokens,
            vec!["the", "cat", "is", "a", "small", "domesticated", "carnivore"]
        );
    }

    #[test]
    fn missing_and_invalid_pages_are_not_found() {
        let missing = r#"{"query":{"pages":[{"ns":0,"title":"Qwzx","missing":true}]}}"#;
        assert_eq!(
            parse_extract("Qwzx", missing),
            Err(TokenizeError::NotFound("Qwzx".to_string()))
        );

        let invalid = r#"{"query":{"pages":[{"title":"[]","invalid":true,"invalidreason":"bad"}]}}"#;
        assert!(matches!(
            parse_extract("[]", invalid),
            Err(TokenizeError::NotFound(_))
        ));

        assert!(matches!(
            parse_extract("x", r#"{"batchcomplete":true}"#),
            Err(TokenizeError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_payload_is_a_fetch_error() {
        assert!(matches!(
            parse_extract("x", "<html>"),
            Err(TokenizeError::Fetch(_))
        ));
    }

    #[test]
    fn blank_or_cancelled_requests_never_hit_the_network() {
        let tokenizer = WikipediaTokenizer::new("http://127.0.0.1:9/unused", DEFAULT_TIMEOUT);
        assert!(matches!(
            tokenizer.fetch_and_tokenize("   ", &Cancellation::new()),
            Err(TokenizeError::NotFound(_))
        ));

        let cancelled = Cancellation::new();
        cancelled.cancel();
        assert_eq!(
            tokenizer.fetch_and_tokenize("Cat", &cancelled),
            Err(TokenizeError::Cancelled)
        );
    }

    #[test]
    fn request_timeout_honours_the_deadline() {
        let tokenizer = WikipediaTokenizer::new(DEFAULT_API_URL, Duration::from_secs(10));
        assert_eq!(
            tokenizer.request_timeout(&Cancellation::new()),
            Duration::from_secs(10)
        );
        let short = Cancellation::with_timeout(Duration::from_millis(50));
        assert!(tokenizer.request_timeout(&short) <= Duration::from_millis(50));
    }
}
