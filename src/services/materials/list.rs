use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::MaterialService;
use crate::models::{ApiResponse, ErrorCode, materials::responses::MaterialListResponse};
use crate::services::courses::current_course;

pub async fn list_materials(
    service: &MaterialService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    // 学生只看已发布的
    match storage.list_materials(course.id, !access.can_manage()).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            MaterialListResponse { items },
            "Material list retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to list materials of course {}: {}", course.id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to retrieve material list",
                )),
            )
        }
    }
}
