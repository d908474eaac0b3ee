use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{CourseService, current_course};
use crate::models::{
    ApiResponse, ErrorCode,
    courses::{requests::UpdateCourseRequest, responses::CourseResponse},
};
use crate::utils::validate::validate_course_name;

pub async fn update_course(
    service: &CourseService,
    request: &HttpRequest,
    mut update_data: UpdateCourseRequest,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    if let Some(name) = update_data.name.take() {
        let name = name.trim().to_string();
        if let Err(msg) = validate_course_name(&name) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::CourseNameInvalid, msg)));
        }
        match storage.get_course_by_name(&name).await {
            Ok(Some(other)) if other.id != course.id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::CourseAlreadyExists,
                    "Course name already exists",
                )));
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to check course name: {}", e);
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::CourseUpdateFailed,
                        "Course update failed",
                    )),
                );
            }
        }
        update_data.name = Some(name);
    }

    match storage.update_course(course.id, update_data).await {
        Ok(Some(course)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            CourseResponse { course, access },
            "Course updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseNotFound,
            "Course not found",
        ))),
        Err(e) => {
            error!("Failed to update course {}: {}", course.id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::CourseUpdateFailed,
                    "Course update failed",
                )),
            )
        }
    }
}
