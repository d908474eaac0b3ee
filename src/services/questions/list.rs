use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{QuestionService, present};
use crate::models::{ApiResponse, ErrorCode, questions::responses::QuestionListResponse};
use crate::services::{courses::current_course, materials::visible_material};

pub async fn list_questions(
    service: &QuestionService,
    request: &HttpRequest,
    material_id: i64,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    if let Err(resp) = visible_material(&storage, &course, access, material_id).await {
        return Ok(resp);
    }

    match storage.list_questions(material_id).await {
        Ok(questions) => {
            let items = questions.into_iter().map(|q| present(q, access)).collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                QuestionListResponse { items },
                "Question list retrieved successfully",
            )))
        }
        Err(e) => {
            error!("Failed to list questions of material {}: {}", material_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to retrieve question list",
                )),
            )
        }
    }
}
