use crate::{config::AppConfig, errors::ServiceError};
use async_trait::async_trait;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// One line of a hosted checkout session, in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    pub description: Option<String>,
    pub unit_amount: i64,
    pub quantity: i64,
    pub image_url: Option<String>,
}

/// Request to open a hosted checkout session. The order id is the only
/// metadata handed to the processor; pricing never round-trips through it.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub order_id: Uuid,
    pub customer_email: String,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub line_items: Vec<SessionLineItem>,
}

/// A created hosted checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct HostedSession {
    pub id: String,
    pub url: String,
}

/// Converts a currency amount to minor units (cents).
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::from(100))
        .round_dp(0)
        .to_i64()
        .ok_or_else(|| {
            ServiceError::InternalError(format!("Amount {} out of range for minor units", amount))
        })
}

/// Hosted-payment processor client. Checkout opens sessions; the success
/// redirect resolves a session back to the order it references.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<HostedSession, ServiceError>;

    /// Resolves a checkout session to the order id stored in its metadata.
    /// Unknown sessions and sessions without order metadata yield `None`.
    async fn find_order_for_session(
        &self,
        payment_session_id: &str,
    ) -> Result<Option<Uuid>, ServiceError>;
}

/// Stripe Checkout implementation of [`PaymentGateway`].
///
/// All calls carry a bounded timeout; transport failures and non-2xx
/// responses surface as retryable provider errors, never hangs.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    metadata: Option<serde_json::Value>,
}

impl StripeGateway {
    pub fn new(
        secret_key: String,
        api_base: String,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(
            cfg.payment_secret_key.clone(),
            cfg.payment_api_base.clone(),
            Duration::from_secs(cfg.payment_timeout_secs),
        )
    }

    /// Form-encodes a session create request the way the Stripe API expects
    /// indexed nested params.
    fn session_form(request: &CreateSessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("customer_email".to_string(), request.customer_email.clone()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "metadata[order_id]".to_string(),
                request.order_id.to_string(),
            ),
        ];

        for (i, item) in request.line_items.iter().enumerate() {
            form.push((format!("line_items[{}][quantity]", i), item.quantity.to_string()));
            form.push((
                format!("line_items[{}][price_data][currency]", i),
                request.currency.clone(),
            ));
            form.push((
                format!("line_items[{}][price_data][unit_amount]", i),
                item.unit_amount.to_string(),
            ));
            form.push((
                format!("line_items[{}][price_data][product_data][name]", i),
                item.name.clone(),
            ));
            if let Some(description) = &item.description {
                form.push((
                    format!("line_items[{}][price_data][product_data][description]", i),
                    description.clone(),
                ));
            }
            if let Some(image_url) = &item.image_url {
                form.push((
                    format!("line_items[{}][price_data][product_data][images][0]", i),
                    image_url.clone(),
                ));
            }
        }

        form
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<HostedSession, ServiceError> {
        let form = Self::session_form(&request);
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| ServiceError::PaymentProviderError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Checkout session create failed: {} {}", status, body);
            return Err(ServiceError::PaymentProviderError(format!(
                "session create returned {}",
                status
            )));
        }

        let session: HostedSession = response
            .json()
            .await
            .map_err(|e| ServiceError::PaymentProviderError(e.to_string()))?;

        info!("Created checkout session {}", session.id);
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn find_order_for_session(
        &self,
        payment_session_id: &str,
    ) -> Result<Option<Uuid>, ServiceError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.api_base, payment_session_id
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| ServiceError::PaymentProviderError(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::PaymentProviderError(format!(
                "session retrieve returned {}",
                status
            )));
        }

        let envelope: SessionEnvelope = response
            .json()
            .await
            .map_err(|e| ServiceError::PaymentProviderError(e.to_string()))?;

        let order_id = envelope
            .metadata
            .as_ref()
            .and_then(|m| m.get("order_id"))
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());

        Ok(order_id)
    }
}
