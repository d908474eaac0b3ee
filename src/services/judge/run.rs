use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::{JudgeService, coding_task, judge_error_response};
use crate::models::{
    ApiResponse,
    judge::{requests::RunRequest, responses::RunResponse},
};
use crate::services::{courses::current_course, questions::question_in_course};

/// 以自定义输入运行一次，使用题目的资源限制
pub async fn run_code(
    service: &JudgeService,
    request: &HttpRequest,
    question_id: i64,
    body: RunRequest,
) -> ActixResult<HttpResponse> {
    let (course, access) = match current_course(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;
    let engine = service.get_engine(request)?;

    let question = match question_in_course(&storage, &course, access, question_id).await {
        Ok(question) => question,
        Err(resp) => return Ok(resp),
    };
    let task = match coding_task(question, body.language.as_deref()) {
        Ok(task) => task,
        Err(resp) => return Ok(resp),
    };

    match engine
        .run_once(
            &task.language,
            body.source_code,
            body.stdin,
            task.time_limit_ms,
            task.memory_limit_kb,
        )
        .await
    {
        Ok(result) => {
            debug!("Run for question {} ended {:?}", question_id, result.status);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                RunResponse { result },
                "Run completed",
            )))
        }
        Err(e) => Ok(judge_error_response(e)),
    }
}
