use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{MaterialService, visible_material};
use crate::models::ApiResponse;
use crate::services::courses::current_course;

pub async fn get_material(
    service: &MaterialService,
    request: &HttpRequest,
    material_id: i64,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match visible_material(&storage, &course, access, material_id).await {
        Ok(material) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            material,
            "Material retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}
