use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{CourseService, current_course};
use crate::models::{ApiResponse, courses::responses::CourseResponse};

pub async fn get_course(
    _service: &CourseService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        CourseResponse { course, access },
        "Course retrieved successfully",
    )))
}
