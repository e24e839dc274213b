//! The concrete HTTP client for the refinery service.

use super::types::{
    AnalysisReport, GenerateResponse, PipelinePayload, PreviewData, UploadResponse,
};
use crate::catalog::OperationDefinition;
use crate::config::ApiConfig;
use crate::error::{PrimaError, Result, ResultExt as _};
use crate::export::CodegenBackend;
use crate::preview::PreviewBackend;
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Typed wrapper over the service endpoints.
///
/// Holds a connection-pooling [`reqwest::Client`] with the configured
/// per-request timeout; cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

/// FastAPI error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Envelope of `GET /options`.
#[derive(Debug, Deserialize)]
struct OptionsResponse {
    operations: Vec<OperationDefinition>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PrimaError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Upload a CSV file into a new or existing dataset session.
    ///
    /// The session id is chosen by the caller (a fresh UUID for a new
    /// session); the service answers with the sampled row count.
    pub async fn upload(&self, session_id: &str, file: &Path) -> Result<UploadResponse> {
        if file.extension().and_then(|e| e.to_str()) != Some("csv") {
            return Err(PrimaError::InvalidPath(format!(
                "Only .csv files are supported: {}",
                file.display()
            )));
        }

        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_owned());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")?;
        let form = multipart::Form::new().part("file", part);

        let url = self.config.endpoint(&format!("upload/{session_id}"));
        tracing::debug!(%url, "uploading dataset");
        let response = self.http.post(url).multipart(form).send().await?;
        decode(response).await
    }

    /// Fetch the column profile of the session's sampled dataset.
    pub async fn analyze(&self, session_id: &str) -> Result<AnalysisReport> {
        let url = self.config.endpoint(&format!("analyze/{session_id}"));
        tracing::debug!(%url, "fetching analysis report");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    /// Fetch the operation catalog.
    pub async fn options(&self) -> Result<Vec<OperationDefinition>> {
        let url = self.config.endpoint("options");
        tracing::debug!(%url, "fetching operation catalog");
        let response = self.http.get(url).send().await?;
        let body: OptionsResponse = decode(response).await?;
        Ok(body.operations)
    }
}

/// Decode a response body, mapping HTTP error statuses to
/// [`PrimaError::Remote`] with the service's `detail` message when present.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let detail = match response.json::<ErrorBody>().await {
        Ok(body) => body.detail,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned(),
    };

    Err(PrimaError::Remote {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait]
impl PreviewBackend for ApiClient {
    async fn preview(&self, payload: &PipelinePayload) -> Result<PreviewData> {
        let url = self.config.endpoint("preview");
        tracing::debug!(%url, steps = payload.steps.len(), "requesting preview");
        let response = self.http.post(url).json(payload).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl CodegenBackend for ApiClient {
    async fn generate_code(&self, payload: &PipelinePayload) -> Result<GenerateResponse> {
        let url = self.config.endpoint("generate-code");
        tracing::debug!(%url, steps = payload.steps.len(), "requesting code generation");
        let response = self.http.post(url).json(payload).send().await?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_csv_upload() {
        let client = ApiClient::new(&ApiConfig::default()).unwrap();
        let err = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(client.upload("sess", Path::new("data.parquet")))
            .unwrap_err();
        assert!(matches!(err, PrimaError::InvalidPath(_)));
    }

    #[test]
    fn test_error_body_parsing() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail": "Session expired or not found."}"#).unwrap();
        assert_eq!(body.detail, "Session expired or not found.");
    }
}
