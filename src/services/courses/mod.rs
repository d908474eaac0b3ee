pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::middlewares::RequireCourseAccess;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::{
        entities::{Course, CourseAccess},
        requests::{CourseQueryParams, CreateCourseRequest, UpdateCourseRequest},
    },
};
use crate::storage::Storage;

pub struct CourseService {
    storage: Option<Arc<dyn Storage>>,
}

impl CourseService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    // 获取课程列表
    pub async fn list_courses(
        &self,
        request: &HttpRequest,
        query: CourseQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::list_courses(self, request, query).await
    }

    // 创建课程
    pub async fn create_course(
        &self,
        request: &HttpRequest,
        course_data: CreateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_course(self, request, course_data).await
    }

    pub async fn get_course(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_course(self, request).await
    }

    pub async fn update_course(
        &self,
        request: &HttpRequest,
        update_data: UpdateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_course(self, request, update_data).await
    }

    pub async fn delete_course(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_course(self, request).await
    }
}

/// 取出课程访问中间件写入的课程与身份
pub(crate) fn current_course(request: &HttpRequest) -> Result<(Course, CourseAccess), HttpResponse> {
    match (
        RequireCourseAccess::extract_course(request),
        RequireCourseAccess::extract_access(request),
    ) {
        (Some(course), Some(access)) => Ok((course, access)),
        _ => Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::CoursePermissionDenied,
            "Course access was not resolved",
        ))),
    }
}
