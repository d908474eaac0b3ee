use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::MaterialService;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, materials::requests::CreateMaterialRequest};
use crate::services::courses::current_course;
use crate::utils::validate::{validate_material_title, validate_position};

pub async fn create_material(
    service: &MaterialService,
    request: &HttpRequest,
    mut body: CreateMaterialRequest,
) -> ActixResult<HttpResponse> {
    let (course, _) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        )));
    };

    body.title = body.title.trim().to_string();
    if let Err(msg) = validate_material_title(&body.title) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::MaterialTitleInvalid, msg)));
    }
    if let Some(position) = body.position
        && let Err(msg) = validate_position(position)
    {
        return Ok(
            HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, msg))
        );
    }

    let storage = service.get_storage(request)?;

    match storage.create_material(course.id, user_id, body).await {
        Ok(material) => {
            info!("Material {} created in course {}", material.id, course.id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(material, "Material created successfully")))
        }
        Err(e) => {
            error!("Material creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::MaterialCreationFailed,
                    "Material creation failed",
                )),
            )
        }
    }
}
