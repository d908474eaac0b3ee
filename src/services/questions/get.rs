use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{QuestionService, present, question_in_material};
use crate::models::ApiResponse;
use crate::services::courses::current_course;

pub async fn get_question(
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

    match question_in_material(&storage, &course, access, material_id, question_id).await {
        Ok(question) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            present(question, access),
            "Question retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}
