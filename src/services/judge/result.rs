use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::JudgeService;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, users::entities::UserRole};

pub async fn get_result(
    service: &JudgeService,
    request: &HttpRequest,
    handle: &str,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request)?;

    let Some(report) = engine.result(handle) else {
        return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::JudgeResultNotFound,
            "Judge result not found or expired",
        )));
    };

    let report = match RequireJWT::extract_user_role(request) {
        Some(UserRole::Student) | None => report.redact_hidden(),
        Some(_) => report,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Judge result retrieved")))
}
