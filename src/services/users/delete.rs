use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::UserService;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, courses::requests::CourseListQuery};

pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 禁止删除当前用户
    if RequireJWT::extract_user_id(request) == Some(user_id) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot delete current user",
        )));
    }

    let storage = service.get_storage(request)?;

    // 删除教师会级联删除其课程，需先转移或删除课程
    let taught = storage
        .list_courses_with_pagination(CourseListQuery {
            page: Some(1),
            size: Some(1),
            teacher_id: Some(user_id),
            ..Default::default()
        })
        .await;
    match taught {
        Ok(page) if page.pagination.total > 0 => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserStillTeaching,
                format!(
                    "User still teaches {} course(s); delete or reassign them first",
                    page.pagination.total
                ),
            )));
        }
        Ok(_) => {}
        Err(e) => {
            error!("Failed to check courses of user {}: {}", user_id, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::UserDeleteFailed,
                    "User deletion failed",
                )),
            );
        }
    }

    match storage.delete_user(user_id).await {
        Ok(true) => {
            info!("User {} deleted", user_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => {
            error!("Failed to delete user {}: {}", user_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::UserDeleteFailed,
                    "User deletion failed",
                )),
            )
        }
    }
}
