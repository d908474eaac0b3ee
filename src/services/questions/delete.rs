use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{QuestionService, question_in_material, question_not_found};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::courses::current_course;

pub async fn delete_question(
    service: &QuestionService,
    request: &HttpRequest,
    material_id: i64,
    question_id: i64,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    if let Err(resp) =
        question_in_material(&storage, &course, access, material_id, question_id).await
    {
        return Ok(resp);
    }

    match storage.delete_question(question_id).await {
        Ok(true) => {
            info!("Question {} deleted from material {}", question_id, material_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Question deleted successfully")))
        }
        Ok(false) => Ok(question_not_found()),
        Err(e) => {
            error!("Failed to delete question {}: {}", question_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::QuestionDeleteFailed,
                    "Question deletion failed",
                )),
            )
        }
    }
}
