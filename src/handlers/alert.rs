use actix_web::web::{Bytes, Data};
use actix_web::{post, HttpRequest, HttpResponse, Result};
use validator::Validate;

use crate::models::common::ApiError;
use crate::models::notification::{AlertAccepted, TriggerAlertRequest};
use crate::services::alert::{AlertService, PushOutcome};

pub const SIGNATURE_HEADER: &str = "X-Signature";

// POST / - synchronous alert ingress for trusted callers. The signature is
// computed over the raw body, so the body is taken as bytes and parsed only
// after verification.
#[post("")]
pub async fn trigger_alert(
    req: HttpRequest,
    body: Bytes,
    alerts: Data<AlertService>,
) -> Result<HttpResponse> {
    let signature = match req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(signature) if !signature.is_empty() => signature,
        _ => {
            return Ok(HttpResponse::Unauthorized().json(ApiError::new("Missing signature")));
        }
    };

    if !alerts.verify_signature(&body, signature) {
        log::warn!("Alert ingress signature mismatch");
        return Ok(HttpResponse::Forbidden().json(ApiError::new("Invalid signature")));
    }

    let payload: TriggerAlertRequest = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiError::with_details("Invalid input", e.to_string())));
        }
    };
    if let Err(e) = payload.validate() {
        return Ok(
            HttpResponse::BadRequest().json(ApiError::with_details("Invalid input", e.to_string()))
        );
    }

    let outcome = alerts
        .dispatch(
            &payload.user_id,
            &payload.device_id,
            payload.kind,
            &payload.message,
            payload.push_token.as_deref(),
        )
        .await;

    match outcome.push {
        // The synchronous variant surfaces provider failures; the audit
        // entry was written anyway, so its id rides along.
        PushOutcome::Failed(err) => Ok(HttpResponse::InternalServerError().json(
            serde_json::json!({
                "error": "Push delivery failed",
                "details": err.to_string(),
                "logId": outcome.entry.id,
            }),
        )),
        _ => Ok(HttpResponse::Ok().json(AlertAccepted {
            success: true,
            log_id: outcome.entry.id,
        })),
    }
}
