use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireCourseAccess};
use crate::models::enrollments::requests::{EnrollStudentsRequest, EnrollmentListParams};
use crate::services::EnrollmentService;
use crate::utils::SafeUserIdI64;

// 懒加载的全局 ENROLLMENT_SERVICE 实例
static ENROLLMENT_SERVICE: Lazy<EnrollmentService> = Lazy::new(EnrollmentService::new_lazy);

pub async fn list_students(
    req: HttpRequest,
    query: web::Query<EnrollmentListParams>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .list_students(&req, query.into_inner())
        .await
}

pub async fn enroll_students(
    req: HttpRequest,
    body: web::Json<EnrollStudentsRequest>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .enroll_students(&req, body.into_inner())
        .await
}

pub async fn unenroll_student(
    req: HttpRequest,
    user_id: SafeUserIdI64,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.unenroll_student(&req, user_id.0).await
}

// 配置路由
pub fn configure_enrollments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses/{course_id}/students")
            // 名单管理仅限授课教师和管理员
            .wrap(RequireCourseAccess::manage())
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_students))
                    .route(web::post().to(enroll_students)),
            )
            .service(web::resource("/{user_id}").route(web::delete().to(unenroll_student))),
    );
}
