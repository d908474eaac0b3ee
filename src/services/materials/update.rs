use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{MaterialService, material_not_found, visible_material};
use crate::models::{ApiResponse, ErrorCode, materials::requests::UpdateMaterialRequest};
use crate::services::courses::current_course;
use crate::utils::validate::{validate_material_title, validate_position};

pub async fn update_material(
    service: &MaterialService,
    request: &HttpRequest,
    material_id: i64,
    mut body: UpdateMaterialRequest,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };

    if let Some(title) = body.title.take() {
        let title = title.trim().to_string();
        if let Err(msg) = validate_material_title(&title) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::MaterialTitleInvalid, msg)));
        }
        body.title = Some(title);
    }
    if let Some(position) = body.position
        && let Err(msg) = validate_position(position)
    {
        return Ok(
            HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, msg))
        );
    }

    let storage = service.get_storage(request)?;
    if let Err(resp) = visible_material(&storage, &course, access, material_id).await {
        return Ok(resp);
    }

    match storage.update_material(material_id, body).await {
        Ok(Some(material)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            material,
            "Material updated successfully",
        ))),
        Ok(None) => Ok(material_not_found()),
        Err(e) => {
            error!("Failed to update material {}: {}", material_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::MaterialUpdateFailed,
                    "Material update failed",
                )),
            )
        }
    }
}
