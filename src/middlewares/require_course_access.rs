/*!
 * 课程访问控制中间件
 *
 * 必须放在 RequireJWT 之后使用。读取路径参数 `course_id`，确定当前用户与课程的关系：
 *
 * - 管理员：`admin`
 * - 授课教师：`instructor`
 * - 已选课学生：`student`
 *
 * 课程不存在返回 404，无关系返回 403。通过后把 [`CourseAccess`] 和 [`Course`]
 * 写入请求扩展。嵌套使用时（scope 上 `any()`，路由上 `manage()`）内层复用外层结果。
 *
 * ```rust,ignore
 * web::scope("/{course_id}")
 *     .wrap(RequireCourseAccess::any())
 *     .route("", web::get().to(get_course))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error};

use super::create_error_response;
use crate::errors::Result;
use crate::models::{
    ErrorCode,
    courses::entities::{Course, CourseAccess},
    users::entities::{User, UserRole},
};
use crate::storage::Storage;

#[derive(Clone, Copy)]
pub struct RequireCourseAccess {
    manage_only: bool,
}

impl RequireCourseAccess {
    /// 任意课程身份均可访问
    pub fn any() -> Self {
        Self { manage_only: false }
    }

    /// 仅授课教师和管理员
    pub fn manage() -> Self {
        Self { manage_only: true }
    }

    pub fn extract_access(req: &actix_web::HttpRequest) -> Option<CourseAccess> {
        req.extensions().get::<CourseAccess>().copied()
    }

    pub fn extract_course(req: &actix_web::HttpRequest) -> Option<Course> {
        req.extensions().get::<Course>().cloned()
    }
}

/// 计算用户对课程的访问身份
pub async fn resolve_course_access(
    storage: &dyn Storage,
    user: &User,
    course: &Course,
) -> Result<Option<CourseAccess>> {
    match user.role {
        UserRole::Admin => Ok(Some(CourseAccess::Admin)),
        UserRole::Teacher if course.teacher_id == user.id => Ok(Some(CourseAccess::Instructor)),
        UserRole::Teacher => Ok(None),
        UserRole::Student => Ok(storage
            .get_enrollment(course.id, user.id)
            .await?
            .map(|_| CourseAccess::Student)),
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireCourseAccess
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireCourseAccessMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireCourseAccessMiddleware {
            service: Rc::new(service),
            manage_only: self.manage_only,
        }))
    }
}

pub struct RequireCourseAccessMiddleware<S> {
    service: Rc<S>,
    manage_only: bool,
}

impl<S, B> Service<ServiceRequest> for RequireCourseAccessMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let manage_only = self.manage_only;

        Box::pin(async move {
            macro_rules! reject {
                ($status:expr, $code:expr, $msg:expr) => {
                    return Ok(req.into_response(
                        create_error_response($status, $code, $msg).map_into_right_body(),
                    ))
                };
            }

            // 1. 当前用户
            let user = req.extensions().get::<User>().cloned();
            let Some(user) = user else {
                reject!(
                    StatusCode::UNAUTHORIZED,
                    ErrorCode::Unauthorized,
                    "Authentication required"
                );
            };

            // 外层已解析过时直接复用
            let resolved = {
                let ext = req.extensions();
                ext.get::<CourseAccess>().copied().zip(ext.get::<Course>().cloned())
            };
            if let Some((access, course)) = resolved {
                if manage_only && !access.can_manage() {
                    reject!(
                        StatusCode::FORBIDDEN,
                        ErrorCode::CoursePermissionDenied,
                        "Only the course instructor can do this"
                    );
                }
                debug!("Reusing {} access to course {}", access, course.id);
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            // 2. course_id
            let course_id = match req
                .match_info()
                .get("course_id")
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|id| *id > 0)
            {
                Some(id) => id,
                None => reject!(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::BadRequest,
                    "Missing or invalid course_id"
                ),
            };

            let storage = req
                .app_data::<web::Data<Arc<dyn Storage>>>()
                .map(|data| data.get_ref().clone());
            let Some(storage) = storage else {
                error!("Storage missing from app data");
                reject!(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    "Storage unavailable"
                );
            };

            // 3. 课程必须存在
            let course = match storage.get_course_by_id(course_id).await {
                Ok(Some(course)) => course,
                Ok(None) => reject!(
                    StatusCode::NOT_FOUND,
                    ErrorCode::CourseNotFound,
                    "Course not found"
                ),
                Err(e) => {
                    error!("Failed to load course {}: {}", course_id, e);
                    reject!(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorCode::InternalServerError,
                        "Failed to load course"
                    );
                }
            };

            // 4. 身份判定
            let access = match resolve_course_access(storage.as_ref(), &user, &course).await {
                Ok(Some(access)) => access,
                Ok(None) => reject!(
                    StatusCode::FORBIDDEN,
                    ErrorCode::CoursePermissionDenied,
                    "No permission for this course"
                ),
                Err(e) => {
                    error!("Failed to resolve access to course {}: {}", course_id, e);
                    reject!(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorCode::InternalServerError,
                        "Failed to check course access"
                    );
                }
            };

            if manage_only && !access.can_manage() {
                reject!(
                    StatusCode::FORBIDDEN,
                    ErrorCode::CoursePermissionDenied,
                    "Only the course instructor can do this"
                );
            }

            debug!("User {} reaches course {} as {}", user.id, course_id, access);
            req.extensions_mut().insert(access);
            req.extensions_mut().insert(course);
            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::requests::CreateCourseRequest;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, seed_user};
    use actix_web::{App, HttpRequest, HttpResponse, test};

    async fn show_access(req: HttpRequest) -> HttpResponse {
        match RequireCourseAccess::extract_access(&req) {
            Some(access) => HttpResponse::Ok().body(access.to_string()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    #[tokio::test]
    async fn test_resolve_course_access() {
        let storage = memory_storage().await;
        let admin = seed_user(&storage, "admin_user", UserRole::Admin).await;
        let teacher = seed_user(&storage, "teacher_a", UserRole::Teacher).await;
        let other = seed_user(&storage, "teacher_b", UserRole::Teacher).await;
        let student = seed_user(&storage, "student_a", UserRole::Student).await;

        let course = storage
            .create_course(
                teacher.id,
                CreateCourseRequest {
                    teacher_id: None,
                    name: "Rust 101".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        for (user, expected) in [
            (&admin, Some(CourseAccess::Admin)),
            (&teacher, Some(CourseAccess::Instructor)),
            (&other, None),
            (&student, None),
        ] {
            let access = resolve_course_access(&storage, user, &course).await.unwrap();
            assert_eq!(access, expected, "user {}", user.username);
        }

        storage
            .create_enrollments(course.id, &[student.id])
            .await
            .unwrap();
        let access = resolve_course_access(&storage, &student, &course)
            .await
            .unwrap();
        assert_eq!(access, Some(CourseAccess::Student));
    }

    #[actix_web::test]
    async fn test_middleware_statuses() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "teacher_a", UserRole::Teacher).await;
        let student = seed_user(&storage, "student_a", UserRole::Student).await;
        let course = storage
            .create_course(
                teacher.id,
                CreateCourseRequest {
                    teacher_id: None,
                    name: "Algorithms".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        storage
            .create_enrollments(course.id, &[student.id])
            .await
            .unwrap();

        let storage: Arc<dyn Storage> = Arc::new(storage);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .service(
                    web::scope("/courses/{course_id}")
                        .service(
                            web::scope("/manage")
                                .wrap(RequireCourseAccess::manage())
                                .route("", web::get().to(show_access)),
                        )
                        .service(
                            web::scope("")
                                .wrap(RequireCourseAccess::any())
                                .route("", web::get().to(show_access)),
                        ),
                ),
        )
        .await;

        let call = |uri: String, user: &User| {
            let req = test::TestRequest::get().uri(&uri).to_request();
            req.extensions_mut().insert(user.clone());
            req
        };

        let resp = test::call_service(&app, call(format!("/courses/{}", course.id), &student)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "student");

        let resp = test::call_service(
            &app,
            call(format!("/courses/{}/manage", course.id), &student),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            call(format!("/courses/{}/manage", course.id), &teacher),
        )
        .await;
        assert_eq!(test::read_body(resp).await, "instructor");

        let resp = test::call_service(&app, call("/courses/9999".to_string(), &teacher)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_nested_manage_reuses_access() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "teacher_a", UserRole::Teacher).await;
        let student = seed_user(&storage, "student_a", UserRole::Student).await;
        let course = storage
            .create_course(
                teacher.id,
                CreateCourseRequest {
                    teacher_id: None,
                    name: "Compilers".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        storage
            .create_enrollments(course.id, &[student.id])
            .await
            .unwrap();

        let storage: Arc<dyn Storage> = Arc::new(storage);
        let app = test::init_service(
            App::new().app_data(web::Data::new(storage)).service(
                web::scope("/courses/{course_id}")
                    .wrap(RequireCourseAccess::any())
                    .route(
                        "/edit",
                        web::post()
                            .to(show_access)
                            .wrap(RequireCourseAccess::manage()),
                    ),
            ),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/courses/{}/edit", course.id))
            .to_request();
        req.extensions_mut().insert(student.clone());
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri(&format!("/courses/{}/edit", course.id))
            .to_request();
        req.extensions_mut().insert(teacher.clone());
        let resp = test::call_service(&app, req).await;
        assert_eq!(test::read_body(resp).await, "instructor");
    }
}
