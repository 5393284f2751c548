//! Submission of one NF-e payload to the Bling v3 endpoint, or a simulated
//! response when test mode is on. Every failure comes back as a `Result`
//! value; the orchestrator decides what it means for the workflow.

use async_trait::async_trait;
use chrono::Local;

use crate::config::AppConfig;
use crate::core::token::TokenManager;
use crate::domain::model::{InvoiceKind, InvoicePayload, InvoiceResponse};
use crate::domain::ports::{InvoiceSubmitter, TokenStore};
use crate::utils::error::{AutomationError, Result};

const SIMULATED_NUMBER: &str = "999999";
const PAYLOAD_LOG_LIMIT: usize = 500;

pub struct NfeEmitter<S: TokenStore> {
    tokens: TokenManager<S>,
    http: reqwest::Client,
    nfe_url: String,
    simulate: bool,
    detailed_simulation: bool,
}

impl<S: TokenStore> NfeEmitter<S> {
    pub fn new(tokens: TokenManager<S>, config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.api.timeout_seconds))
            .build()?;

        Ok(Self {
            tokens,
            http,
            nfe_url: config.api.nfe_url.clone(),
            simulate: config.simulation_enabled(),
            detailed_simulation: config.policy.detailed_simulation,
        })
    }

    fn simulated(&self, payload: &InvoicePayload, kind: InvoiceKind) -> InvoiceResponse {
        tracing::warn!("⚠️ TEST MODE - simulating {} emission, nothing is sent", kind);
        if let Ok(json) = serde_json::to_string_pretty(payload) {
            tracing::debug!(
                "Payload prepared:\n{}",
                json.chars().take(PAYLOAD_LOG_LIMIT).collect::<String>()
            );
        }

        InvoiceResponse {
            id: Some(format!(
                "TEST_{}_{}",
                kind.label(),
                Local::now().format("%H%M%S")
            )),
            numero: Some(SIMULATED_NUMBER.to_string()),
            serie: self.detailed_simulation.then(|| "1".to_string()),
            situacao: self.detailed_simulation.then(|| "TEST".to_string()),
        }
    }
}

#[async_trait]
impl<S: TokenStore> InvoiceSubmitter for NfeEmitter<S> {
    async fn submit(&self, payload: &InvoicePayload, kind: InvoiceKind) -> Result<InvoiceResponse> {
        // Simulation never touches the network, token refresh included.
        if self.simulate {
            return Ok(self.simulated(payload, kind));
        }

        let access_token = self.tokens.access_token().await?;

        tracing::info!("📤 Submitting {} NF-e ({} item(s))", kind, payload.itens.len());

        let response = self
            .http
            .post(&self.nfe_url)
            .bearer_auth(access_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 200 || status == 201 {
            let body: serde_json::Value = response.json().await?;
            let parsed = InvoiceResponse::from_api_body(&body);
            tracing::info!(
                "✅ {} NF-e accepted, number {}",
                kind,
                parsed.numero.as_deref().unwrap_or("N/A")
            );
            Ok(parsed)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AutomationError::remote_rejection(status, &body))
        }
    }
}
