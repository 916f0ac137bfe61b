use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tracing::{debug, error, info, warn};

use crate::error::{ClientError, GENERIC_ERROR};
use crate::model::{ErrorDetail, FileSelection, ProgressStep, QuotationResult, ResponseMode};
use crate::ndjson::NdjsonDecoder;
use crate::state::Event;
use crate::transport::{ReqwestTransport, Transport, UploadResponse};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Clone)]
pub struct QuotationClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    mode: ResponseMode,
    timeout: Duration,
}

impl QuotationClient {
    pub fn new(base_url: &str, mode: ResponseMode, timeout: Duration) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()), base_url, mode, timeout)
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        base_url: &str,
        mode: ResponseMode,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            mode,
            timeout,
        }
    }

    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.base_url)
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// Upload both documents and wait for the quotation. In streaming mode
    /// `on_progress` is called once per body chunk that completed at least one
    /// progress step.
    pub async fn submit<F>(
        &self,
        files: &FileSelection,
        on_progress: F,
    ) -> Result<QuotationResult, ClientError>
    where
        F: FnMut(Vec<ProgressStep>) + Send,
    {
        if !files.is_complete() {
            return Err(ClientError::MissingFiles);
        }

        match tokio::time::timeout(self.timeout, self.exchange(files, on_progress)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.timeout.as_secs())),
        }
    }

    /// Run one submission and report it as session events: any number of
    /// `ChunkReceived`, then exactly one `StreamEnded` or `RequestFailed`.
    pub async fn run<E>(&self, files: FileSelection, mut emit: E)
    where
        E: FnMut(Event) + Send,
    {
        let outcome = self
            .submit(&files, |steps| emit(Event::ChunkReceived(steps)))
            .await;

        let event = match outcome {
            Ok(result) => Event::StreamEnded(result),
            Err(e) => {
                error!(error = %e, "quotation request failed");
                Event::RequestFailed(e.to_string())
            }
        };
        emit(event);
    }

    async fn exchange<F>(
        &self,
        files: &FileSelection,
        on_progress: F,
    ) -> Result<QuotationResult, ClientError>
    where
        F: FnMut(Vec<ProgressStep>) + Send,
    {
        let url = self.upload_url();
        info!(url = %url, mode = self.mode.as_str(), "uploading documents");

        let response = self.transport.upload(&url, files).await?;
        if !response.is_success() {
            return Err(http_error(response).await);
        }

        match self.mode {
            ResponseMode::Buffered => read_buffered(response).await,
            ResponseMode::Streaming => read_streaming(response, on_progress).await,
        }
    }
}

async fn http_error(response: UploadResponse) -> ClientError {
    let status = response.status;
    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorDetail>(&body)
        .ok()
        .and_then(|d| d.detail)
        .unwrap_or_else(|| GENERIC_ERROR.to_string());
    warn!(status, message = %message, "backend rejected upload");
    ClientError::Http { status, message }
}

async fn read_buffered(response: UploadResponse) -> Result<QuotationResult, ClientError> {
    let body = response.bytes().await?;
    let result: QuotationResult = serde_json::from_slice(&body)?;
    result.validate()?;
    info!(premium = result.premium, risk_score = result.risk_score, "quotation received");
    Ok(result)
}

async fn read_streaming<F>(
    mut response: UploadResponse,
    mut on_progress: F,
) -> Result<QuotationResult, ClientError>
where
    F: FnMut(Vec<ProgressStep>) + Send,
{
    let mut decoder = NdjsonDecoder::new();

    while let Some(chunk) = response.body.next().await {
        let chunk = chunk?;
        debug!(bytes = chunk.len(), "stream chunk");
        let steps = decoder.push(&chunk);
        if !steps.is_empty() {
            on_progress(steps);
        }
    }

    let result = decoder.finish()?;
    info!(
        premium = result.premium,
        risk_score = result.risk_score,
        steps = decoder.steps().len(),
        discarded = decoder.discarded(),
        "quotation stream finished"
    );
    Ok(result)
}
