//! REST adapter for the turnos backend
//!
//! Every call returns a tagged `Result<T, ApiError>`. Envelopes that come back
//! with `success: false` are mapped to `ApiError::Rejected` carrying the
//! server's message, so callers never inspect loosely typed payloads.

use crate::models::{Area, CreateTurnRequest, Service, Ticket, ValidatedClient};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum length for error body content in error messages
const MAX_ERROR_BODY_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// Response envelopes
// ============================================================================

#[derive(Debug, Deserialize)]
struct AreasEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    areas: Vec<Area>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServicesEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    servicios: Vec<Service>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateTurnEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    turno: Option<Ticket>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContractEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    cliente: Option<ValidatedClient>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    #[serde(default)]
    message: Option<String>,
}

fn rejected(message: Option<String>, fallback: &str) -> ApiError {
    ApiError::Rejected(message.unwrap_or_else(|| fallback.to_string()))
}

fn decode_areas(body: &str) -> Result<Vec<Area>, ApiError> {
    let envelope: AreasEnvelope =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if !envelope.success {
        return Err(rejected(envelope.message, "areas unavailable"));
    }
    Ok(envelope.areas)
}

fn decode_services(body: &str) -> Result<Vec<Service>, ApiError> {
    let envelope: ServicesEnvelope =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if !envelope.success {
        return Err(rejected(envelope.message, "services unavailable"));
    }
    Ok(envelope.servicios)
}

fn decode_created_turn(body: &str) -> Result<Ticket, ApiError> {
    let envelope: CreateTurnEnvelope =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    match (envelope.success, envelope.turno) {
        (true, Some(ticket)) => Ok(ticket),
        (true, None) => Err(ApiError::Decode("turno missing from response".to_string())),
        (false, _) => Err(rejected(envelope.message, "turno no creado")),
    }
}

fn decode_contract(body: &str) -> Result<ValidatedClient, ApiError> {
    let envelope: ContractEnvelope =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    match (envelope.success, envelope.cliente) {
        (true, Some(client)) => Ok(client),
        (true, None) => Err(ApiError::Decode("cliente missing from response".to_string())),
        (false, _) => Err(rejected(envelope.message, "contrato no encontrado")),
    }
}

/// Pull the server's `message` out of an error body when there is one.
fn error_from_body(status: u16, body: &str) -> ApiError {
    if let Ok(MessageEnvelope { message: Some(msg) }) = serde_json::from_str(body) {
        return ApiError::Rejected(msg);
    }
    ApiError::Status {
        status,
        body: crate::util::truncate(body, MAX_ERROR_BODY_LEN),
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client bound to one backend base URL
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = normalize_base_url(base_url)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        join_segments(&self.base, segments)
    }

    async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(error_from_body(status.as_u16(), &body))
        }
    }

    /// `GET areas?branch=&esCliente=`
    pub async fn list_areas(&self, branch_id: &str, is_client: bool) -> Result<Vec<Area>, ApiError> {
        let url = self.endpoint(&["areas"])?;
        let response = self
            .http
            .get(url)
            .query(&[("branch", branch_id), ("esCliente", bool_param(is_client))])
            .send()
            .await?;
        decode_areas(&Self::read_body(response).await?)
    }

    /// `GET services?area=&esCliente=`
    pub async fn list_services(
        &self,
        area_id: &str,
        is_client: bool,
    ) -> Result<Vec<Service>, ApiError> {
        let url = self.endpoint(&["services"])?;
        let response = self
            .http
            .get(url)
            .query(&[("area", area_id), ("esCliente", bool_param(is_client))])
            .send()
            .await?;
        decode_services(&Self::read_body(response).await?)
    }

    /// `GET clientes/contrato/{contract}`
    pub async fn validate_contract(&self, contract: &str) -> Result<ValidatedClient, ApiError> {
        let url = self.endpoint(&["clientes", "contrato", contract])?;
        let response = self.http.get(url).send().await?;
        decode_contract(&Self::read_body(response).await?)
    }

    /// `POST turnos/crear`
    pub async fn create_turn(&self, request: &CreateTurnRequest) -> Result<Ticket, ApiError> {
        let url = self.endpoint(&["turnos", "crear"])?;
        let response = self.http.post(url).json(request).send().await?;
        decode_created_turn(&Self::read_body(response).await?)
    }

    /// `DELETE turnos/cancelar/{id}`; returns the server's confirmation message.
    pub async fn cancel_turn(&self, ticket_id: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["turnos", "cancelar", ticket_id])?;
        let response = self.http.delete(url).send().await?;
        let body = Self::read_body(response).await?;
        let message = serde_json::from_str::<MessageEnvelope>(&body)
            .ok()
            .and_then(|m| m.message)
            .unwrap_or_else(|| "Turno cancelado".to_string());
        Ok(message)
    }

    /// Fetch the ticket PDF from its canonical URL.
    pub async fn fetch_pdf(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Append percent-encoded path segments under `base`.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Parse the configured base URL and make sure relative joins stay under it.
pub fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}
