//! HTTP client implementation for the voice-synthesis service.

use std::time::Duration;

use reqwest::{
    Client as ReqwestClient, Response,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{Error, Result};

/// HTTP client for the synthesis service API.
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub fn new(base_url: String, api_key: String, max_retries: u32) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            max_retries,
        })
    }

    /// Makes an HTTP request to the API with retry support.
    ///
    /// Retries only transport failures and retryable API errors (429/5xx),
    /// with exponential backoff between attempts.
    pub async fn request<T, R>(&self, method: &str, path: &str, body: Option<&T>) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, ...
                let backoff = Duration::from_secs(1 << (attempt - 1));
                debug!(path, attempt, ?backoff, "retrying request");
                tokio::time::sleep(backoff).await;
            }

            match self.do_request(method, path, body).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.is_retryable() {
                        last_err = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Other("max retries exceeded".to_string())))
    }

    /// Performs a single HTTP request.
    async fn do_request<T, R>(&self, method: &str, path: &str, body: Option<&T>) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut request = match method {
            "GET" => self.client.get(&url),
            "POST" => self.client.post(&url),
            "DELETE" => self.client.delete(&url),
            _ => return Err(Error::Other(format!("unsupported method: {}", method))),
        };

        request = request.headers(self.default_headers()?);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Returns default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("revoice-cloneapi/1.0"));
        Ok(headers)
    }

    /// Handles the API response.
    async fn handle_response<R>(&self, response: Response) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(parse_error(&body, status.as_u16()));
        }

        serde_json::from_slice(&body).map_err(Error::from)
    }
}

/// Parses an error response body.
fn parse_error(body: &[u8], http_status: u16) -> Error {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        #[serde(alias = "detail")]
        error: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = parsed.error {
            return Error::api(http_status, message);
        }
    }

    Error::api(http_status, String::from_utf8_lossy(body).to_string())
}

#[cfg(test)]
mod http_tests {
    use super::*;

    #[test]
    fn parse_error_reads_error_field() {
        let err = parse_error(br#"{"error":"voice not found"}"#, 404);
        match err {
            Error::Api {
                http_status,
                message,
            } => {
                assert_eq!(http_status, 404);
                assert_eq!(message, "voice not found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn parse_error_falls_back_to_raw_body() {
        let err = parse_error(b"gateway timeout", 504);
        assert!(err.to_string().contains("gateway timeout"));
        assert!(err.is_retryable());
    }
}
