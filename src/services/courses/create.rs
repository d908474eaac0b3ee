use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::CourseService;
use crate::middlewares::RequireJWT;
use crate::models::courses::requests::CreateCourseRequest;
use crate::models::courses::responses::CourseResponse;
use crate::models::courses::entities::CourseAccess;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::validate::validate_course_name;

pub async fn create_course(
    service: &CourseService,
    request: &HttpRequest,
    mut course_data: CreateCourseRequest,
) -> ActixResult<HttpResponse> {
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        )));
    };

    course_data.name = course_data.name.trim().to_string();
    if let Err(msg) = validate_course_name(&course_data.name) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::CourseNameInvalid, msg)));
    }

    let storage = service.get_storage(request)?;

    // 确定授课教师
    let teacher_id = match resolve_teacher(&user, &course_data, &storage).await {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match storage.get_course_by_name(&course_data.name).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::CourseAlreadyExists,
                "Course name already exists",
            )));
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to check course name: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::CourseCreationFailed,
                    "Course creation failed",
                )),
            );
        }
    }

    match storage.create_course(teacher_id, course_data).await {
        Ok(course) => {
            info!("Course {} created by {}", course.name, user.id);
            let access = if user.role == UserRole::Admin {
                CourseAccess::Admin
            } else {
                CourseAccess::Instructor
            };
            Ok(HttpResponse::Created().json(ApiResponse::success(
                CourseResponse { course, access },
                "Course created successfully",
            )))
        }
        Err(e) => {
            error!("Course creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::CourseCreationFailed,
                    "Course creation failed",
                )),
            )
        }
    }
}

/// 教师只能为自己创建；管理员必须指定一位教师
async fn resolve_teacher(
    user: &User,
    course_data: &CreateCourseRequest,
    storage: &Arc<dyn Storage>,
) -> Result<i64, HttpResponse> {
    match user.role {
        UserRole::Teacher => match course_data.teacher_id {
            None => Ok(user.id),
            Some(id) if id == user.id => Ok(id),
            Some(_) => Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::CoursePermissionDenied,
                "You can not create a course for another teacher",
            ))),
        },
        UserRole::Admin => {
            let Some(teacher_id) = course_data.teacher_id else {
                return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::CourseTeacherInvalid,
                    "teacher_id is required",
                )));
            };
            match storage.get_user_by_id(teacher_id).await {
                Ok(Some(teacher)) if teacher.role == UserRole::Teacher => Ok(teacher.id),
                Ok(Some(_)) => Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::CourseTeacherInvalid,
                    "The given user is not a teacher",
                ))),
                Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::UserNotFound,
                    "Teacher not found",
                ))),
                Err(e) => {
                    error!("Failed to get user by id: {}", e);
                    Err(
                        HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                            ErrorCode::InternalServerError,
                            "Internal server error while fetching teacher",
                        )),
                    )
                }
            }
        }
        UserRole::Student => Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::CoursePermissionDenied,
            "You do not have permission to create a course",
        ))),
    }
}
