//! 评测机 HTTP 客户端
//!
//! 对接 Judge0 兼容接口：先 `POST /submissions` 拿到 token，
//! 再 `GET /submissions/{token}` 轮询状态。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::JudgeConfig;
use crate::errors::{ClassworkError, Result};

const AUTH_HEADER: &str = "X-Auth-Token";

/// 单次执行请求
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRequest {
    pub language_id: i64,
    pub source_code: String,
    pub stdin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    /// 秒
    pub cpu_time_limit: f64,
    /// KB
    pub memory_limit: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionState {
    pub id: i64,
    #[serde(default)]
    pub description: String,
}

/// 评测机返回的执行状态
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionStatus {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    pub message: Option<String>,
    /// 秒，字符串形式，例如 "0.002"
    pub time: Option<String>,
    pub memory: Option<u64>,
    pub status: ExecutionState,
}

impl ExecutionStatus {
    pub const IN_QUEUE: i64 = 1;
    pub const PROCESSING: i64 = 2;
    pub const ACCEPTED: i64 = 3;
    pub const WRONG_ANSWER: i64 = 4;

    pub fn is_pending(&self) -> bool {
        matches!(self.status.id, Self::IN_QUEUE | Self::PROCESSING)
    }

    pub fn time_ms(&self) -> Option<u64> {
        self.time
            .as_deref()
            .and_then(|t| t.trim().parse::<f64>().ok())
            .filter(|t| t.is_finite() && *t >= 0.0)
            .map(|secs| (secs * 1000.0).round() as u64)
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    token: String,
}

#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// 提交执行，返回评测机 token
    async fn submit(&self, request: &ExecutionRequest) -> Result<String>;

    /// 查询 token 对应的执行状态
    async fn fetch(&self, token: &str) -> Result<ExecutionStatus>;
}

pub struct Judge0Client {
    client: reqwest::Client,
    base_url: String,
}

impl Judge0Client {
    pub fn new(config: &JudgeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let value = HeaderValue::from_str(&config.api_key)
                .map_err(|e| ClassworkError::judge_connection(format!("Invalid judge API key: {e}")))?;
            headers.insert(AUTH_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClassworkError::judge_protocol(format!(
            "Judge returned {status}: {body}"
        )))
    }
}

#[async_trait]
impl JudgeClient for Judge0Client {
    async fn submit(&self, request: &ExecutionRequest) -> Result<String> {
        let url = format!(
            "{}/submissions?base64_encoded=false&wait=false",
            self.base_url
        );
        let response = self.client.post(&url).json(request).send().await?;
        let body: SubmitResponse = Self::check_status(response).await?.json().await?;
        debug!("Judge accepted submission, token {}", body.token);
        Ok(body.token)
    }

    async fn fetch(&self, token: &str) -> Result<ExecutionStatus> {
        let url = format!(
            "{}/submissions/{}?base64_encoded=false",
            self.base_url, token
        );
        let response = self.client.get(&url).send().await?;
        let status = Self::check_status(response).await?.json().await?;
        Ok(status)
    }
}
