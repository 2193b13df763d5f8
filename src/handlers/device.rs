use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, HttpResponse, Result};
use validator::Validate;

use crate::models::common::ApiError;
use crate::models::device::{RegisterDeviceRequest, ReportStatusRequest};
use crate::services::alert::{AlertService, PushOutcome, TriggerOutcome};
use crate::services::database::DatabaseService;

// POST /register
#[post("/register")]
pub async fn register_device(
    db: Data<DatabaseService>,
    payload: Json<RegisterDeviceRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiError::with_details("Invalid input", e.to_string())));
    }

    if db.get_user(&payload.user_id).is_none() {
        return Ok(HttpResponse::NotFound().json(ApiError::new("User not found")));
    }

    match db.register_ownership(&payload.device_id, &payload.user_id) {
        Ok(ownership) => Ok(HttpResponse::Created().json(ownership)),
        Err(err) => Ok(HttpResponse::Conflict().json(ApiError::new(err.to_string()))),
    }
}

// POST /report - connectivity report from the device or its gateway. The
// upsert yields the before/after pair; the trigger listener decides whether
// this write is the alerting edge.
#[post("/report")]
pub async fn report_status(
    db: Data<DatabaseService>,
    alerts: Data<AlertService>,
    payload: Json<ReportStatusRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiError::with_details("Invalid input", e.to_string())));
    }

    let (previous, current) = db.upsert_device_state(&payload.device_id, payload.connected);
    let outcome = alerts
        .handle_state_written(previous.as_ref(), Some(&current))
        .await;

    let alert = match &outcome {
        TriggerOutcome::NoTransition => "none",
        TriggerOutcome::OwnerUnresolved => "owner_unresolved",
        TriggerOutcome::Dispatched(dispatched) => match dispatched.push {
            PushOutcome::Sent => "dispatched",
            PushOutcome::Skipped => "logged",
            PushOutcome::Failed(_) => "push_failed",
        },
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "device": current,
        "alert": alert,
    })))
}

// GET /status
#[get("/status")]
pub async fn list_device_status(db: Data<DatabaseService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(db.list_device_states()))
}

// GET /{device_id}
#[get("/{device_id}")]
pub async fn get_device(db: Data<DatabaseService>, path: Path<String>) -> Result<HttpResponse> {
    let device_id = path.into_inner();
    match db.get_device_state(&device_id) {
        Some(state) => Ok(HttpResponse::Ok().json(state)),
        None => Ok(HttpResponse::NotFound().json(ApiError::new("Device not found"))),
    }
}
