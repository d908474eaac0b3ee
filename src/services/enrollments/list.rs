use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::EnrollmentService;
use crate::models::{
    ApiResponse, ErrorCode,
    enrollments::requests::{EnrollmentListParams, EnrollmentListQuery},
};
use crate::services::courses::current_course;

pub async fn list_students(
    service: &EnrollmentService,
    request: &HttpRequest,
    query: EnrollmentListParams,
) -> ActixResult<HttpResponse> {
    let (course, _) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    let list_query = EnrollmentListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        search: query.search,
    };

    match storage
        .list_enrollments_with_pagination(course.id, list_query)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Student list retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to list students of course {}: {}", course.id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to retrieve student list",
                )),
            )
        }
    }
}
