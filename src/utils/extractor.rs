//! 路径参数提取器
//!
//! 路径中的 ID 必须是正整数，否则直接返回 400 的统一错误响应，不进入业务逻辑。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use std::future::{Ready, ready};

use crate::judge::key::is_result_handle;
use crate::models::{ApiResponse, ErrorCode};

pub(crate) fn bad_path_param(param: &str, message: String) -> actix_web::Error {
    InternalError::from_response(
        format!("invalid path parameter '{param}'"),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

pub fn parse_positive_id(raw: &str) -> Result<i64, String> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(format!("ID must be a positive integer, got {raw}")),
        Err(_) => Err(format!("ID must be a number, got '{raw}'")),
    }
}

pub fn extract_id(req: &HttpRequest, param: &str) -> Result<i64, actix_web::Error> {
    let raw = req
        .match_info()
        .get(param)
        .ok_or_else(|| bad_path_param(param, format!("Missing path parameter '{param}'")))?;
    parse_positive_id(raw).map_err(|msg| bad_path_param(param, msg))
}

/// 定义一个从指定路径参数读取正整数 ID 的提取器
///
/// 生成的类型既可直接作为 handler 参数，也可放在 `web::Path<(A, B)>` 元组中使用。
#[macro_export]
macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl $name {
            pub const PARAM: &'static str = $param;
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                $crate::utils::extractor::parse_positive_id(&raw)
                    .map($name)
                    .map_err(serde::de::Error::custom)
            }
        }

        impl actix_web::FromRequest for $name {
            type Error = actix_web::Error;
            type Future = std::future::Ready<Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                _payload: &mut actix_web::dev::Payload,
            ) -> Self::Future {
                std::future::ready($crate::utils::extractor::extract_id(req, $param).map($name))
            }
        }
    };
}

define_safe_i64_extractor!(SafeIDI64, "id");
define_safe_i64_extractor!(SafeCourseIdI64, "course_id");
define_safe_i64_extractor!(SafeMaterialIdI64, "material_id");
define_safe_i64_extractor!(SafeQuestionIdI64, "question_id");
define_safe_i64_extractor!(SafeUserIdI64, "user_id");

/// 评测结果句柄（64 位小写十六进制）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeJudgeHandle(pub String);

impl FromRequest for SafeJudgeHandle {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let handle = req.match_info().get("handle").unwrap_or_default();
        if is_result_handle(handle) {
            ready(Ok(SafeJudgeHandle(handle.to_string())))
        } else {
            ready(Err(bad_path_param(
                "handle",
                "Judge result handle is malformed".to_string(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test::TestRequest};

    #[actix_web::test]
    async fn test_valid_id() {
        let req = TestRequest::default()
            .param("course_id", "42")
            .to_http_request();
        let id = SafeCourseIdI64::extract(&req).await.unwrap();
        assert_eq!(id.0, 42);
    }

    #[actix_web::test]
    async fn test_rejects_non_positive_and_garbage() {
        for raw in ["0", "-3", "abc", "1.5"] {
            let req = TestRequest::default().param("id", raw).to_http_request();
            let err = SafeIDI64::extract(&req).await.unwrap_err();
            assert_eq!(err.as_response_error().status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn test_missing_param() {
        let req = TestRequest::default().to_http_request();
        assert!(SafeMaterialIdI64::extract(&req).await.is_err());
    }

    #[actix_web::test]
    async fn test_judge_handle() {
        let handle = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";
        let req = TestRequest::default().param("handle", handle).to_http_request();
        assert_eq!(SafeJudgeHandle::extract(&req).await.unwrap().0, handle);

        // 压缩键形式不再被接受
        let upper = handle.to_uppercase();
        for raw in ["eJyrVkrLz1eyUkpKLFKqBQAdegQ-", "abc+/=", upper.as_str()] {
            let req = TestRequest::default().param("handle", raw.to_owned()).to_http_request();
            assert!(SafeJudgeHandle::extract(&req).await.is_err());
        }
    }

    #[test]
    fn test_deserialize_in_tuple() {
        let parsed: (SafeCourseIdI64, SafeUserIdI64) =
            serde_json::from_str(r#"["3", "7"]"#).unwrap();
        assert_eq!(parsed, (SafeCourseIdI64(3), SafeUserIdI64(7)));
        assert!(serde_json::from_str::<(SafeCourseIdI64, SafeUserIdI64)>(r#"["3", "0"]"#).is_err());
    }
}
