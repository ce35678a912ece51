use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use perfai_core::{DashboardStats, JobId, JobSummary, RawJobResponse, StartedAnalysis};
use perfai_logging::perfai_debug;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::token::TokenProvider;
use crate::{ApiError, ApiFailureKind};

pub const DEFAULT_BASE_URL: &str = "https://prfeai-backend.onrender.com/api";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_body_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Fetches one job snapshot. The transport the poller is driven by.
#[async_trait::async_trait]
pub trait JobFetcher: Send + Sync {
    async fn fetch_job(&self, job_id: &JobId) -> Result<RawJobResponse, ApiError>;
}

/// Starts the secondary (AI-insight) phase of a job.
#[async_trait::async_trait]
pub trait GenerationTrigger: Send + Sync {
    async fn trigger_generation(&self, job_id: &JobId) -> Result<(), ApiError>;
}

/// The full backend surface used by the engine.
#[async_trait::async_trait]
pub trait AnalysisApi: JobFetcher + GenerationTrigger {
    async fn start_analysis(&self, url: &str) -> Result<StartedAnalysis, ApiError>;
    async fn history(&self, limit: Option<usize>) -> Result<Vec<JobSummary>, ApiError>;
    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError>;
}

#[derive(Serialize)]
struct StartRequest<'a> {
    url: &'a str,
}

/// REST client for the analysis backend.
#[derive(Clone)]
pub struct ApiClient {
    settings: ClientSettings,
    base_url: Url,
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(settings: ClientSettings, tokens: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(ApiFailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                ApiFailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiFailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base_url,
            http,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base_url` with `segments` appended as percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ApiError::new(ApiFailureKind::InvalidUrl, "base url cannot carry a path")
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        perfai_debug!("GET {}", url);
        let body = self.send(self.http.get(url)).await?;
        decode(&body)
    }

    async fn post(&self, url: Url, body: Option<Vec<u8>>) -> Result<Vec<u8>, ApiError> {
        perfai_debug!("POST {}", url);
        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }
        self.send(request).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let request = match self.tokens.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                ApiFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_body_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    ApiFailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    ApiFailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl JobFetcher for ApiClient {
    async fn fetch_job(&self, job_id: &JobId) -> Result<RawJobResponse, ApiError> {
        let url = self.endpoint(&["analysis", job_id.as_str()])?;
        self.get_json(url).await
    }
}

#[async_trait::async_trait]
impl GenerationTrigger for ApiClient {
    async fn trigger_generation(&self, job_id: &JobId) -> Result<(), ApiError> {
        let url = self.endpoint(&["analysis", job_id.as_str(), "ai"])?;
        // The body is `{}` or empty; only the status matters.
        self.post(url, None).await.map(|_| ())
    }
}

#[async_trait::async_trait]
impl AnalysisApi for ApiClient {
    async fn start_analysis(&self, url: &str) -> Result<StartedAnalysis, ApiError> {
        let endpoint = self.endpoint(&["analysis", "start"])?;
        let body = serde_json::to_vec(&StartRequest { url })
            .map_err(|err| ApiError::new(ApiFailureKind::Decode, err.to_string()))?;
        let response = self.post(endpoint, Some(body)).await?;
        decode(&response)
    }

    async fn history(&self, limit: Option<usize>) -> Result<Vec<JobSummary>, ApiError> {
        let mut url = self.endpoint(&["analysis", "history"])?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        self.get_json(url).await
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let url = self.endpoint(&["dashboard", "stats"])?;
        self.get_json(url).await
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::new(ApiFailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiFailureKind::Timeout, err.to_string());
    }
    ApiError::new(ApiFailureKind::Network, err.to_string())
}
