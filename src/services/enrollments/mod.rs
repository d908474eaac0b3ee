pub mod delete;
pub mod enroll;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::enrollments::requests::{EnrollStudentsRequest, EnrollmentListParams};
use crate::storage::Storage;

pub struct EnrollmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl EnrollmentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    // 课程学生名单
    pub async fn list_students(
        &self,
        request: &HttpRequest,
        query: EnrollmentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_students(self, request, query).await
    }

    // 批量选课
    pub async fn enroll_students(
        &self,
        request: &HttpRequest,
        body: EnrollStudentsRequest,
    ) -> ActixResult<HttpResponse> {
        enroll::enroll_students(self, request, body).await
    }

    // 退课
    pub async fn unenroll_student(
        &self,
        request: &HttpRequest,
        user_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::unenroll_student(self, request, user_id).await
    }
}
