pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod judge;
pub mod materials;
pub mod questions;
pub mod users;

use actix_web::{HttpRequest, Result as ActixResult, error::ErrorInternalServerError, web};
use std::sync::Arc;

use crate::storage::Storage;

pub use auth::AuthService;
pub use courses::CourseService;
pub use enrollments::EnrollmentService;
pub use judge::JudgeService;
pub use materials::MaterialService;
pub use questions::QuestionService;
pub use users::UserService;

// 从 app data 取出存储实例
pub(crate) fn storage_from_request(
    storage: &Option<Arc<dyn Storage>>,
    request: &HttpRequest,
) -> ActixResult<Arc<dyn Storage>> {
    if let Some(storage) = storage {
        return Ok(storage.clone());
    }
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            tracing::error!("Storage not found in app data");
            ErrorInternalServerError("Storage not configured")
        })
}
