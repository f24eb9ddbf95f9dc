use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::GatewayConfig;

use super::{
    AiGateway, AnalysisRequest, AnalysisResponse, GatewayError, InvoiceDraftRequest,
    InvoiceDraftResponse, TranscriptionRequest, TranscriptionResponse,
};

/// JSON-over-HTTP gateway client. Every call carries a timeout; a hung
/// backend surfaces through the same failure path as any other gateway error.
#[derive(Debug, Clone)]
pub struct HttpAiGateway {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpAiGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_base_url(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    async fn post<Request, Response>(
        &self,
        path: &str,
        body: &Request,
    ) -> Result<Response, GatewayError>
    where
        Request: Serialize + Sync,
        Response: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "calling AI gateway");
        let call = async {
            let response = self.client.post(&url).json(body).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(GatewayError::Status(status.as_u16()));
            }
            let bytes = response.bytes().await?;
            serde_json::from_slice(&bytes)
                .map_err(|error| GatewayError::InvalidResponse(error.to_string()))
        };
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[async_trait]
impl AiGateway for HttpAiGateway {
    #[instrument(skip(self, request))]
    async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionResponse, GatewayError> {
        self.post("transcribe", &request).await
    }

    #[instrument(skip(self, request))]
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, GatewayError> {
        self.post("analyze", &request).await
    }

    #[instrument(skip(self, request))]
    async fn draft_invoice(
        &self,
        request: InvoiceDraftRequest,
    ) -> Result<InvoiceDraftResponse, GatewayError> {
        self.post("draft-invoice", &request).await
    }
}
