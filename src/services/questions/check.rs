use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{QuestionService, question_in_material};
use crate::models::{
    ApiResponse, ErrorCode,
    questions::{requests::CheckAnswerRequest, responses::CheckAnswerResponse},
};
use crate::services::courses::current_course;

/// 选择题自测，全对得满分，否则 0 分
pub async fn check_answer(
    service: &QuestionService,
    request: &HttpRequest,
    material_id: i64,
    question_id: i64,
    body: CheckAnswerRequest,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    let question =
        match question_in_material(&storage, &course, access, material_id, question_id).await {
            Ok(question) => question,
            Err(resp) => return Ok(resp),
        };

    let Some(correct) = question.details.check_choice(&body.selected) else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::QuestionKindMismatch,
            format!(
                "Only multiple choice questions can be checked, got {}",
                question.details.kind()
            ),
        )));
    };

    let awarded_points = if correct { question.points } else { 0.0 };
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        CheckAnswerResponse {
            correct,
            awarded_points,
            max_points: question.points,
        },
        "Answer checked",
    )))
}
