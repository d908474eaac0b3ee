pub mod result;
pub mod run;
pub mod stream;

use actix_web::{
    HttpRequest, HttpResponse, Result as ActixResult, error::ErrorInternalServerError, web,
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::errors::ClassworkError;
use crate::judge::JudgeEngine;
use crate::models::{
    ApiResponse, ErrorCode,
    judge::requests::{JudgeRequest, RunRequest},
    questions::entities::{Question, QuestionDetails, TestCase},
};
use crate::storage::Storage;

pub struct JudgeService {
    storage: Option<Arc<dyn Storage>>,
}

impl JudgeService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    pub(crate) fn get_engine(&self, request: &HttpRequest) -> ActixResult<Arc<JudgeEngine>> {
        request
            .app_data::<web::Data<Arc<JudgeEngine>>>()
            .map(|data| data.get_ref().clone())
            .ok_or_else(|| {
                error!("Judge engine not found in app data");
                ErrorInternalServerError("Judge not configured")
            })
    }

    // 提交评测，流式返回报告
    pub async fn judge_submission(
        &self,
        request: &HttpRequest,
        question_id: i64,
        body: JudgeRequest,
    ) -> ActixResult<HttpResponse> {
        stream::judge_submission(self, request, question_id, body).await
    }

    pub async fn get_result(&self, request: &HttpRequest, handle: &str) -> ActixResult<HttpResponse> {
        result::get_result(self, request, handle).await
    }

    pub async fn run_code(
        &self,
        request: &HttpRequest,
        question_id: i64,
        body: RunRequest,
    ) -> ActixResult<HttpResponse> {
        run::run_code(self, request, question_id, body).await
    }
}

/// 编程题评测所需字段
pub(crate) struct CodingTask {
    pub language: String,
    pub time_limit_ms: Option<u64>,
    pub memory_limit_kb: Option<u64>,
    pub test_cases: Vec<TestCase>,
}

/// 取出编程题配置，并确认提交语言与题目一致
pub(crate) fn coding_task(
    question: Question,
    requested_language: Option<&str>,
) -> Result<CodingTask, HttpResponse> {
    let QuestionDetails::Coding {
        language,
        time_limit_ms,
        memory_limit_kb,
        test_cases,
        ..
    } = question.details
    else {
        return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::QuestionKindMismatch,
            format!("Question {} is not a coding question", question.id),
        )));
    };

    if let Some(requested) = requested_language.map(str::trim).filter(|l| !l.is_empty())
        && !requested.eq_ignore_ascii_case(&language)
    {
        return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::JudgeLanguageUnsupported,
            format!("This question must be answered in {language}"),
        )));
    }

    Ok(CodingTask {
        language,
        time_limit_ms,
        memory_limit_kb,
        test_cases,
    })
}

/// 评测错误转换为 HTTP 响应
pub(crate) fn judge_error_response(err: ClassworkError) -> HttpResponse {
    match err {
        ClassworkError::UnsupportedLanguage(lang) => HttpResponse::BadRequest().json(
            ApiResponse::error_empty(
                ErrorCode::JudgeLanguageUnsupported,
                format!("Language '{lang}' is not supported"),
            ),
        ),
        ClassworkError::JudgeConnection(_) | ClassworkError::JudgeProtocol(_) => {
            warn!("Judge unavailable: {}", err);
            HttpResponse::BadGateway().json(ApiResponse::error_empty(
                ErrorCode::JudgeUnavailable,
                "Judge is unavailable",
            ))
        }
        other => {
            error!("Judge request failed: {}", other);
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::JudgeFailed,
                "Judge request failed",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    fn question(details: QuestionDetails) -> Question {
        let now = chrono::Utc::now();
        Question {
            id: 3,
            material_id: 1,
            prompt: "echo".to_string(),
            position: 0,
            points: 10.0,
            details,
            created_at: now,
            updated_at: now,
        }
    }

    fn coding() -> QuestionDetails {
        QuestionDetails::Coding {
            language: "python".to_string(),
            starter_code: String::new(),
            time_limit_ms: Some(2000),
            memory_limit_kb: None,
            test_cases: vec![TestCase {
                input: "1".to_string(),
                expected_output: "1".to_string(),
                hidden: false,
            }],
        }
    }

    #[test]
    fn test_coding_task_defaults_language() {
        let task = coding_task(question(coding()), None).unwrap();
        assert_eq!(task.language, "python");
        assert_eq!(task.time_limit_ms, Some(2000));
        assert_eq!(task.test_cases.len(), 1);

        let task = coding_task(question(coding()), Some("Python")).unwrap();
        assert_eq!(task.language, "python");
    }

    #[test]
    fn test_coding_task_rejects_other_language() {
        let resp = coding_task(question(coding()), Some("rust")).err().unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_coding_task_rejects_other_kinds() {
        let details = QuestionDetails::ShortAnswer {
            reference_answer: None,
        };
        let resp = coding_task(question(details), None).err().unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_judge_error_statuses() {
        let cases = [
            (ClassworkError::unsupported_language("cobol"), StatusCode::BAD_REQUEST),
            (ClassworkError::judge_connection("refused"), StatusCode::BAD_GATEWAY),
            (ClassworkError::judge_protocol("bad json"), StatusCode::BAD_GATEWAY),
            (ClassworkError::serialization("oops"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(judge_error_response(err).status(), status);
        }
    }
}
