//! Request/response contracts for the external generative-AI backend.
//!
//! The gateway never mutates a work order: callers merge a response into the
//! store only after it arrives complete and schema-valid, so a failed or
//! partial call leaves prior state intact.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::models::work_order::{CustomerInfo, PartCost};

mod http;

pub use http::HttpAiGateway;

/// Marker the model returns for any field it cannot determine. Fields are
/// never omitted from a response.
pub const UNKNOWN_MARKER: &str = "unknown";

/// Filters the explicit unknown marker (and blank strings) out of a
/// best-effort transcription field.
pub fn known(field: &str) -> Option<&str> {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_MARKER) {
        None
    } else {
        Some(trimmed)
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned status {0}")]
    Status(u16),

    #[error("schema-invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("gateway call timed out after {0}s")]
    Timeout(u64),

    #[error("invalid audio data URI: {0}")]
    InvalidAudio(String),
}

/// Self-describing audio payload, carried on the wire as
/// `data:<mime-type>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDataUri {
    mime_type: String,
    data: Vec<u8>,
}

impl AudioDataUri {
    pub fn from_bytes(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn parse(uri: &str) -> Result<Self, GatewayError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| GatewayError::InvalidAudio("missing data: scheme".to_string()))?;
        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            GatewayError::InvalidAudio("missing payload separator".to_string())
        })?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
            GatewayError::InvalidAudio("payload must be base64-encoded".to_string())
        })?;
        if mime_type.is_empty() || !mime_type.contains('/') {
            return Err(GatewayError::InvalidAudio(format!(
                "malformed MIME type {:?}",
                mime_type
            )));
        }
        let data = BASE64
            .decode(payload)
            .map_err(|error| GatewayError::InvalidAudio(format!("undecodable payload: {}", error)))?;
        Ok(Self {
            mime_type: mime_type.to_string(),
            data,
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn to_uri_string(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.data))
    }
}

impl Serialize for AudioDataUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_uri_string())
    }
}

impl<'de> Deserialize<'de> for AudioDataUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        AudioDataUri::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRequest {
    pub audio_data_uri: AudioDataUri,
}

/// Best-effort extraction from an audio recording. Undetermined fields carry
/// [`UNKNOWN_MARKER`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionResponse {
    pub customer_details: String,
    pub job_description: String,
    pub urgency: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub job_description: String,
    pub customer_details: String,
    pub urgency: String,
    pub location: String,
}

/// All fields are free-form descriptive strings, not structured data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub part_list: String,
    pub job_duration_estimate: String,
    pub urgency_level: String,
    pub tools_needed: String,
    pub man_hours_needed: String,
}

/// Itemized line on the invoice-drafting request; monetary values cross the
/// wire as plain JSON numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePartLine {
    pub part_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub quantity: u32,
}

impl From<&PartCost> for InvoicePartLine {
    fn from(part: &PartCost) -> Self {
        Self {
            part_name: part.part_name.clone(),
            cost: part.cost,
            quantity: part.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraftRequest {
    pub customer_info: CustomerInfo,
    pub job_summary: String,
    pub part_costs: Vec<InvoicePartLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub labor_estimate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_rate: Decimal,
}

/// The gateway's `total_amount` is authoritative for display, but the local
/// invoice computation remains the source of truth for cross-checking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraftResponse {
    pub invoice_text: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

/// The three calls the lifecycle logic consumes. All are asynchronous and may
/// fail; implementations must not touch any work order.
#[async_trait]
pub trait AiGateway: Send + Sync {
    async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionResponse, GatewayError>;

    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, GatewayError>;

    async fn draft_invoice(
        &self,
        request: InvoiceDraftRequest,
    ) -> Result<InvoiceDraftResponse, GatewayError>;
}
