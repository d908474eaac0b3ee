use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::CourseService;
use crate::{
    middlewares::RequireJWT,
    models::{
        ApiResponse, ErrorCode,
        courses::requests::{CourseListQuery, CourseQueryParams},
        users::entities::UserRole,
    },
};

pub async fn list_courses(
    service: &CourseService,
    request: &HttpRequest,
    query: CourseQueryParams,
) -> ActixResult<HttpResponse> {
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        )));
    };
    let storage = service.get_storage(request)?;

    let mut list_query = CourseListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        teacher_id: None,
        student_id: None,
        search: query.search,
    };

    // 管理员看全部，教师看自己授课的，学生看已选的
    match user.role {
        UserRole::Admin => {}
        UserRole::Teacher => list_query.teacher_id = Some(user.id),
        UserRole::Student => list_query.student_id = Some(user.id),
    }

    match storage.list_courses_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Course list retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to list courses for user {}: {}", user.id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to retrieve course list",
                )),
            )
        }
    }
}
