use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, put, HttpResponse, Result};
use validator::Validate;

use crate::models::common::ApiError;
use crate::models::user::{RegisterPushTokenRequest, RegisterUserRequest};
use crate::services::database::DatabaseService;

#[post("/register")]
pub async fn register_user(
    db: Data<DatabaseService>,
    payload: Json<RegisterUserRequest>,
) -> Result<HttpResponse> {
    log::info!("Register request for user {}", payload.user_id);

    if let Err(e) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiError::with_details("Invalid input", e.to_string())));
    }

    match db.create_user(payload.into_inner()) {
        Ok(user) => Ok(HttpResponse::Created().json(user)),
        Err(err) => Ok(HttpResponse::Conflict().json(ApiError::new(err.to_string()))),
    }
}

// PUT /{user_id}/push-token - registers or replaces the client installation
// this user's pushes are addressed to.
#[put("/{user_id}/push-token")]
pub async fn register_push_token(
    db: Data<DatabaseService>,
    path: Path<String>,
    payload: Json<RegisterPushTokenRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiError::with_details("Invalid input", e.to_string())));
    }

    let user_id = path.into_inner();
    match db.set_push_token(&user_id, &payload.push_token) {
        Ok(user) => Ok(HttpResponse::Ok().json(user)),
        Err(err) => Ok(HttpResponse::NotFound().json(ApiError::new(err.to_string()))),
    }
}

#[get("/{user_id}")]
pub async fn get_user(db: Data<DatabaseService>, path: Path<String>) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    match db.get_user(&user_id) {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(HttpResponse::NotFound().json(ApiError::new("User not found"))),
    }
}
