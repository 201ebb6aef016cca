use std::env;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable consulted when [`API_KEY_ENV`] is unset.
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// A boxed stream of streamed response increments.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// Client for the Gemini API.
#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

/// Reads the API key from the environment.
///
/// Empty values are treated as unset.
pub fn api_key_from_env() -> Option<String> {
    [API_KEY_ENV, FALLBACK_API_KEY_ENV]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|key| !key.trim().is_empty())
}

impl Gemini {
    /// Create a new Gemini client.
    ///
    /// The API key can be provided directly or read from the GEMINI_API_KEY
    /// (or API_KEY) environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key.or_else(api_key_from_env) {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                )));
            }
        };

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request, response and stream event.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    /// Build the URL for a model method such as `generateContent`.
    fn endpoint(&self, model: &Model, method: &str, sse: bool) -> Result<Url> {
        let model = model.to_string();
        // Tuned models already carry their collection prefix.
        let path = if model.contains('/') {
            format!("{model}:{method}")
        } else {
            format!("models/{model}:{method}")
        };
        let mut url = self.base_url.join(&path)?;
        if sse {
            url.query_pairs_mut().append_pair("alt", "sse");
        }
        Ok(url)
    }

    fn send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ApiErrorDetail>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|parsed| parsed.error)
            .unwrap_or_else(|| ApiErrorDetail {
                code: Some(status_code),
                message: Some(error_body),
                status: None,
            });
        error_for_status(status_code, detail, retry_after)
    }

    async fn post(
        &self,
        url: Url,
        headers: HeaderMap,
        request: &GenerateContentRequest,
    ) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self
            .client
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            self.send_error(e)
        })?;
        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    /// Send a request to the API and get a non-streaming response.
    pub async fn generate(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        if let Some(logger) = &self.logger {
            logger.log_request(model, request);
        }
        let url = self.endpoint(model, "generateContent", false)?;
        let response = self.post(url, self.default_headers()?, request).await?;

        let response = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(
                    format!("Failed to parse response: {}", e),
                    Some(Box::new(e)),
                )
            })?;
        if let Some(logger) = &self.logger {
            logger.log_response(&response);
        }
        Ok(response)
    }

    /// Send a request to the API and get a streaming response.
    ///
    /// Returns a stream of response increments that can be processed as they arrive.
    pub async fn stream(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<ResponseStream> {
        if let Some(logger) = &self.logger {
            logger.log_request(model, request);
        }
        let url = self.endpoint(model, "streamGenerateContent", true)?;

        let mut headers = self.default_headers()?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        let response = self.post(url, headers, request).await?;
        let event_stream = process_sse(response.bytes_stream());

        match self.logger.clone() {
            Some(logger) => Ok(Box::pin(event_stream.inspect(move |event| {
                if let Ok(event) = event {
                    logger.log_stream_event(event);
                }
            }))),
            None => Ok(Box::pin(event_stream)),
        }
    }
}

/// The `error` object of an API error body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub(crate) code: Option<u16>,
    pub(crate) message: Option<String>,
    pub(crate) status: Option<String>,
}

/// Map an HTTP status code and error detail to our Error type.
pub(crate) fn error_for_status(
    status_code: u16,
    detail: ApiErrorDetail,
    retry_after: Option<u64>,
) -> Error {
    let message = detail
        .message
        .unwrap_or_else(|| "no error message provided".to_string());
    match status_code {
        400 => Error::bad_request(message, detail.status),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, detail.status, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, KnownModel};

    fn test_client() -> Gemini {
        Gemini::new(Some("test-key".to_string())).unwrap()
    }

    #[test]
    fn client_creation() {
        let client = test_client();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some("https://proxy.example.com/v1beta".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url.as_str(), "https://proxy.example.com/v1beta/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = Gemini::new(Some("   ".to_string())).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Gemini::with_options(
            Some("test-key".to_string()),
            Some("not a url".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn debug_hides_key() {
        let rendered = format!("{:?}", test_client());
        assert!(!rendered.contains("test-key"));
    }

    #[test]
    fn stream_endpoint() {
        let client = test_client();
        let url = client
            .endpoint(
                &Model::Known(KnownModel::Gemini25Flash),
                "streamGenerateContent",
                true,
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn tuned_model_endpoint() {
        let client = test_client();
        let url = client
            .endpoint(&Model::from("tunedModels/shop-bot"), "generateContent", false)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/tunedModels/shop-bot:generateContent"
        );
    }

    #[test]
    fn status_mapping() {
        let detail = |message: &str| ApiErrorDetail {
            code: None,
            message: Some(message.to_string()),
            status: Some("STATUS".to_string()),
        };
        assert!(error_for_status(400, detail("bad"), None).is_bad_request());
        assert!(error_for_status(401, detail("who"), None).is_authentication());
        assert!(error_for_status(403, detail("no"), None).is_permission());
        assert!(error_for_status(404, detail("where"), None).is_not_found());
        assert!(error_for_status(429, detail("slow"), Some(3)).is_rate_limit());
        assert!(error_for_status(503, detail("busy"), None).is_server_error());
        assert_eq!(
            error_for_status(418, detail("teapot"), None).status_code(),
            Some(418)
        );
    }

    #[tokio::test]
    #[ignore] // Ignore by default as this requires a real API key
    async fn live_stream() {
        let Some(api_key) = api_key_from_env() else {
            println!("Skipping live_stream: {API_KEY_ENV} not set");
            return;
        };
        let client = Gemini::new(Some(api_key)).unwrap();
        let request = GenerateContentRequest::new(vec![Content::user("Dites bonjour.")]);
        let mut stream = client
            .stream(&Model::Known(KnownModel::Gemini25Flash), &request)
            .await
            .unwrap();

        let mut text = String::new();
        while let Some(event) = stream.next().await {
            text.push_str(&event.unwrap().text());
        }
        assert!(!text.is_empty(), "Expected to receive some text");
    }
}
