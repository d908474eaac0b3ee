use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{
    QuestionService, invalid_question, question_in_material, question_not_found,
    validate_details,
};
use crate::models::{ApiResponse, ErrorCode, questions::requests::UpdateQuestionRequest};
use crate::services::courses::current_course;
use crate::utils::validate::{validate_points, validate_position, validate_question_prompt};

pub async fn update_question(
    service: &QuestionService,
    request: &HttpRequest,
    material_id: i64,
    question_id: i64,
    mut body: UpdateQuestionRequest,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };

    if let Some(prompt) = body.prompt.take() {
        let prompt = prompt.trim().to_string();
        if let Err(msg) = validate_question_prompt(&prompt) {
            return Ok(invalid_question(msg));
        }
        body.prompt = Some(prompt);
    }
    if let Some(points) = body.points
        && let Err(msg) = validate_points(points)
    {
        return Ok(invalid_question(msg));
    }
    if let Some(position) = body.position
        && let Err(msg) = validate_position(position)
    {
        return Ok(invalid_question(msg));
    }
    // details 整体替换，需要完整校验
    if let Some(details) = &body.details
        && let Err(msg) = validate_details(request, details)
    {
        return Ok(invalid_question(msg));
    }

    let storage = service.get_storage(request)?;
    if let Err(resp) =
        question_in_material(&storage, &course, access, material_id, question_id).await
    {
        return Ok(resp);
    }

    match storage.update_question(question_id, body).await {
        Ok(Some(question)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            question,
            "Question updated successfully",
        ))),
        Ok(None) => Ok(question_not_found()),
        Err(e) => {
            error!("Failed to update question {}: {}", question_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::QuestionUpdateFailed,
                    "Question update failed",
                )),
            )
        }
    }
}
