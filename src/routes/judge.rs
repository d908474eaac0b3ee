use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireCourseAccess};
use crate::models::judge::requests::{JudgeRequest, RunRequest};
use crate::services::JudgeService;
use crate::utils::{SafeJudgeHandle, SafeQuestionIdI64};

// 懒加载的全局 JUDGE_SERVICE 实例
static JUDGE_SERVICE: Lazy<JudgeService> = Lazy::new(JudgeService::new_lazy);

pub async fn judge_submission(
    req: HttpRequest,
    question_id: SafeQuestionIdI64,
    body: web::Json<JudgeRequest>,
) -> ActixResult<HttpResponse> {
    JUDGE_SERVICE
        .judge_submission(&req, question_id.0, body.into_inner())
        .await
}

pub async fn run_code(
    req: HttpRequest,
    question_id: SafeQuestionIdI64,
    body: web::Json<RunRequest>,
) -> ActixResult<HttpResponse> {
    JUDGE_SERVICE
        .run_code(&req, question_id.0, body.into_inner())
        .await
}

pub async fn get_result(req: HttpRequest, handle: SafeJudgeHandle) -> ActixResult<HttpResponse> {
    JUDGE_SERVICE.get_result(&req, &handle.0).await
}

// 配置路由
pub fn configure_judge_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses/{course_id}/questions/{question_id}")
            .wrap(middlewares::RateLimit::judge())
            .wrap(RequireCourseAccess::any())
            .wrap(middlewares::RequireJWT)
            .route("/judge", web::post().to(judge_submission))
            .route("/run", web::post().to(run_code)),
    )
    .service(
        web::scope("/api/v1/judge")
            .wrap(middlewares::RequireJWT)
            .route("/results/{handle}", web::get().to(get_result)),
    );
}
