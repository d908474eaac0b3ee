use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireCourseAccess};
use crate::models::courses::requests::{
    CourseQueryParams, CreateCourseRequest, UpdateCourseRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::CourseService;

// 懒加载的全局 COURSE_SERVICE 实例
static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);

// HTTP处理程序
pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<CourseQueryParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(&req, query.into_inner()).await
}

pub async fn create_course(
    req: HttpRequest,
    course_data: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .create_course(&req, course_data.into_inner())
        .await
}

pub async fn get_course(req: HttpRequest) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(&req).await
}

pub async fn update_course(
    req: HttpRequest,
    update_data: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course(&req, update_data.into_inner())
        .await
}

pub async fn delete_course(req: HttpRequest) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_course(&req).await
}

// 配置路由
pub fn configure_courses_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RequireJWT)
            .service(
                // 管理员查看全部，教师查看自己的课程，学生查看已选课程
                web::resource("").route(web::get().to(list_courses)).route(
                    web::post()
                        .to(create_course)
                        // 教师为自己创建，管理员需指定教师
                        .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                ),
            )
            .service(
                web::resource("/{course_id}")
                    .wrap(RequireCourseAccess::any())
                    .route(web::get().to(get_course))
                    .route(
                        web::put()
                            .to(update_course)
                            .wrap(RequireCourseAccess::manage()),
                    )
                    .route(
                        web::delete()
                            .to(delete_course)
                            .wrap(RequireCourseAccess::manage()),
                    ),
            ),
    );
}
