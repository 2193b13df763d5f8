use actix_web::web::{Data, Path, Query};
use actix_web::{get, HttpResponse, Result};

use crate::models::common::{PaginatedResponse, PaginationQuery};
use crate::services::database::DatabaseService;

// GET /user/{user_id} - alert history, newest first.
#[get("/user/{user_id}")]
pub async fn get_notifications(
    db: Data<DatabaseService>,
    path: Path<String>,
    query: Query<PaginationQuery>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (entries, total) = db.get_notifications_by_user(&user_id, page, limit);
    let total_pages = (total + limit - 1) / limit;

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        data: entries,
        total,
        page,
        limit,
        total_pages,
    }))
}
