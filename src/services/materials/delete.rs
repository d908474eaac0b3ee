use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{MaterialService, material_not_found, visible_material};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::courses::current_course;

pub async fn delete_material(
    service: &MaterialService,
    request: &HttpRequest,
    material_id: i64,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    if let Err(resp) = visible_material(&storage, &course, access, material_id).await {
        return Ok(resp);
    }

    match storage.delete_material(material_id).await {
        Ok(true) => {
            info!("Material {} deleted from course {}", material_id, course.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Material deleted successfully")))
        }
        Ok(false) => Ok(material_not_found()),
        Err(e) => {
            error!("Failed to delete material {}: {}", material_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::MaterialDeleteFailed,
                    "Material deletion failed",
                )),
            )
        }
    }
}
