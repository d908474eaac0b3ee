use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::EnrollmentService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::courses::current_course;

pub async fn unenroll_student(
    service: &EnrollmentService,
    request: &HttpRequest,
    user_id: i64,
) -> ActixResult<HttpResponse> {
    let (course, _) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match storage.delete_enrollment(course.id, user_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Student removed from course",
        ))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::EnrollmentNotFound,
            "Student is not enrolled in this course",
        ))),
        Err(e) => {
            error!("Failed to unenroll {} from {}: {}", user_id, course.id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to remove student",
                )),
            )
        }
    }
}
