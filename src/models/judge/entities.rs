use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::questions::entities::TestCase;

/// 一次评测的完整输入，同时也是结果缓存键的来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeSubmission {
    pub language: String,
    pub source_code: String,
    pub test_cases: Vec<TestCase>,
    pub time_limit_ms: Option<u64>,
    pub memory_limit_kb: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/judge.ts")]
pub enum TestCaseStatus {
    Passed,
    Failed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/judge.ts")]
pub struct TestCaseResult {
    pub index: usize,
    pub status: TestCaseStatus,
    #[serde(default)]
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_output: Option<String>,
    /// 评测机状态描述或传输错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_kb: Option<u64>,
}

impl TestCaseResult {
    /// 请求评测机失败时的结果
    pub fn transport_error(index: usize, hidden: bool, message: impl Into<String>) -> Self {
        Self {
            index,
            status: TestCaseStatus::Error,
            hidden,
            stdout: None,
            stderr: None,
            compile_output: None,
            message: Some(message.into()),
            time_ms: None,
            memory_kb: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/judge.ts")]
pub enum JudgeRunState {
    Running,
    Finished,
    Aborted,
}

impl JudgeRunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JudgeRunState::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/judge.ts")]
pub struct JudgeReport {
    /// 结果句柄（缓存键的摘要），不含提交内容
    pub key: String,
    pub state: JudgeRunState,
    pub total: usize,
    pub passed: usize,
    pub results: Vec<TestCaseResult>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl JudgeReport {
    pub fn start(key: String, total: usize) -> Self {
        let now = chrono::Utc::now();
        Self {
            key,
            state: JudgeRunState::Running,
            total,
            passed: 0,
            results: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push(&mut self, result: TestCaseResult) {
        if result.status == TestCaseStatus::Passed {
            self.passed += 1;
        }
        self.results.push(result);
        self.updated_at = chrono::Utc::now();
    }

    pub fn finish(&mut self, state: JudgeRunState) {
        self.state = state;
        self.updated_at = chrono::Utc::now();
    }

    /// 学生视图：隐藏用例只保留状态
    pub fn redact_hidden(mut self) -> Self {
        for result in self.results.iter_mut().filter(|r| r.hidden) {
            result.stdout = None;
            result.stderr = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize, status: TestCaseStatus, hidden: bool) -> TestCaseResult {
        TestCaseResult {
            index,
            status,
            hidden,
            stdout: Some("out".to_string()),
            stderr: Some("err".to_string()),
            compile_output: None,
            message: None,
            time_ms: Some(3),
            memory_kb: Some(1024),
        }
    }

    #[test]
    fn test_report_counts_passed() {
        let mut report = JudgeReport::start("k".to_string(), 3);
        report.push(result(0, TestCaseStatus::Passed, false));
        report.push(result(1, TestCaseStatus::Failed, false));
        report.push(result(2, TestCaseStatus::Passed, true));
        report.finish(JudgeRunState::Finished);

        assert_eq!(report.passed, 2);
        assert_eq!(report.results.len(), 3);
        assert!(report.state.is_terminal());
    }

    #[test]
    fn test_redact_hidden_keeps_status() {
        let mut report = JudgeReport::start("k".to_string(), 2);
        report.push(result(0, TestCaseStatus::Passed, false));
        report.push(result(1, TestCaseStatus::Failed, true));

        let report = report.redact_hidden();
        assert_eq!(report.results[0].stdout.as_deref(), Some("out"));
        assert_eq!(report.results[1].stdout, None);
        assert_eq!(report.results[1].stderr, None);
        assert_eq!(report.results[1].status, TestCaseStatus::Failed);
    }
}
