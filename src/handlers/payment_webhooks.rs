use crate::{errors::ServiceError, services::FinalizeOutcome, AppState};
use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::{info, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Asynchronous confirmation channel: the processor pushes signed events
/// here. Rejections are surfaced at the HTTP level (400/404) so the
/// processor's own retry mechanism redelivers; a duplicate delivery or a
/// lost race against the success redirect is answered 200.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Invalid signature or payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Event references an unknown order", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let secret = &state.config.payment_webhook_secret;
    let tolerance = state.config.payment_webhook_tolerance_secs;
    if !verify_signature(&headers, &body, secret, tolerance) {
        warn!("Payment webhook signature verification failed");
        return Err(ServiceError::InvalidSignature);
    }

    let json: Value = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("invalid json: {}", e)))?;

    let event_type = json.get("type").and_then(|v| v.as_str()).unwrap_or("");
    match event_type {
        "checkout.session.completed" => {
            let order_id = json
                .pointer("/data/object/metadata/order_id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    ServiceError::BadRequest("event is missing order_id metadata".to_string())
                })?;
            let order_id = Uuid::parse_str(order_id).map_err(|_| {
                ServiceError::BadRequest(format!("malformed order_id metadata: {}", order_id))
            })?;

            match state.services.reconciliation.finalize(order_id).await? {
                FinalizeOutcome::Finalized { .. } => {
                    info!("Webhook finalized order {}", order_id);
                }
                FinalizeOutcome::AlreadyFinalized => {
                    info!("Webhook for already-finalized order {}", order_id);
                }
            }
        }
        other => {
            info!("Unhandled payment webhook type: {}", other);
        }
    }

    Ok((axum::http::StatusCode::OK, "ok"))
}

/// Verifies the event signature. Supports generic `x-timestamp`/`x-signature`
/// headers and the Stripe `Stripe-Signature: t=..,v1=..` form; both sign
/// `"{timestamp}.{body}"` with HMAC-SHA256 and are compared in constant time
/// inside a timestamp tolerance window.
fn verify_signature(headers: &HeaderMap, payload: &Bytes, secret: &str, tolerance_secs: u64) -> bool {
    if let (Some(ts), Some(sig)) = (headers.get("x-timestamp"), headers.get("x-signature")) {
        if let (Ok(ts), Ok(sig)) = (ts.to_str(), sig.to_str()) {
            return check_signed_payload(ts, sig, payload, secret, Some(tolerance_secs));
        }
    }

    if let Some(sig) = headers.get("Stripe-Signature").and_then(|h| h.to_str().ok()) {
        let mut ts = "";
        let mut v1 = "";
        for part in sig.split(',') {
            let mut it = part.trim().splitn(2, '=');
            match (it.next(), it.next()) {
                (Some("t"), Some(val)) => ts = val,
                (Some("v1"), Some(val)) => v1 = val,
                _ => {}
            }
        }
        if !ts.is_empty() && !v1.is_empty() {
            return check_signed_payload(ts, v1, payload, secret, Some(tolerance_secs));
        }
    }

    false
}

fn check_signed_payload(
    timestamp: &str,
    signature: &str,
    payload: &Bytes,
    secret: &str,
    tolerance_secs: Option<u64>,
) -> bool {
    if let Some(tolerance) = tolerance_secs {
        match timestamp.parse::<i64>() {
            Ok(ts) => {
                let now = chrono::Utc::now().timestamp();
                if (now - ts).unsigned_abs() > tolerance {
                    return false;
                }
            }
            Err(_) => return false,
        }
    }

    let Ok(body) = std::str::from_utf8(payload) else {
        return false;
    };
    let signed = format!("{}.{}", timestamp, body);
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(signed.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, signature)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
