use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{QuestionService, invalid_question, validate_details};
use crate::models::{ApiResponse, ErrorCode, questions::requests::CreateQuestionRequest};
use crate::services::{courses::current_course, materials::visible_material};
use crate::utils::validate::{validate_points, validate_position, validate_question_prompt};

pub async fn create_question(
    service: &QuestionService,
    request: &HttpRequest,
    material_id: i64,
    mut body: CreateQuestionRequest,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };

    body.prompt = body.prompt.trim().to_string();
    if let Err(msg) = validate_question_prompt(&body.prompt) {
        return Ok(invalid_question(msg));
    }
    if let Err(msg) = validate_points(body.points) {
        return Ok(invalid_question(msg));
    }
    if let Some(position) = body.position
        && let Err(msg) = validate_position(position)
    {
        return Ok(invalid_question(msg));
    }
    if let Err(msg) = validate_details(request, &body.details) {
        return Ok(invalid_question(msg));
    }

    let storage = service.get_storage(request)?;
    if let Err(resp) = visible_material(&storage, &course, access, material_id).await {
        return Ok(resp);
    }

    let kind = body.details.kind();
    match storage.create_question(material_id, body).await {
        Ok(question) => {
            info!(
                "Question {} ({}) created in material {}",
                question.id, kind, material_id
            );
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(question, "Question created successfully")))
        }
        Err(e) => {
            error!("Question creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::QuestionCreationFailed,
                    "Question creation failed",
                )),
            )
        }
    }
}
