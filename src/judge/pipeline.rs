//! 评测执行循环
//!
//! 用例按顺序逐个提交并轮询。出现第一个 `error` 结果（含传输失败）即停止，
//! 报告状态为 `aborted`；否则全部跑完后为 `finished`。

use std::time::Duration;

use tracing::{debug, warn};

use super::client::{ExecutionRequest, ExecutionStatus, JudgeClient};
use crate::errors::{ClassworkError, Result};
use crate::models::judge::entities::{
    JudgeReport, JudgeRunState, TestCaseResult, TestCaseStatus,
};
use crate::models::questions::entities::TestCase;

/// 固定间隔轮询策略
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

/// 提交单次执行并等待其结束
pub async fn execute_case(
    client: &dyn JudgeClient,
    request: &ExecutionRequest,
    policy: PollPolicy,
) -> Result<ExecutionStatus> {
    let token = client.submit(request).await?;

    for _ in 0..policy.max_polls {
        tokio::time::sleep(policy.interval).await;
        let status = client.fetch(&token).await?;
        if !status.is_pending() {
            return Ok(status);
        }
    }

    Err(ClassworkError::judge_protocol(format!(
        "Submission {token} still pending after {} polls",
        policy.max_polls
    )))
}

/// 将评测机状态映射为用例结果
pub fn classify(index: usize, hidden: bool, status: ExecutionStatus) -> TestCaseResult {
    let time_ms = status.time_ms();
    let outcome = match status.status.id {
        ExecutionStatus::ACCEPTED => TestCaseStatus::Passed,
        ExecutionStatus::WRONG_ANSWER => TestCaseStatus::Failed,
        _ => TestCaseStatus::Error,
    };
    let message = status.message.or_else(|| {
        if status.status.description.is_empty() {
            None
        } else {
            Some(status.status.description)
        }
    });

    TestCaseResult {
        index,
        status: outcome,
        hidden,
        stdout: status.stdout,
        stderr: status.stderr,
        compile_output: status.compile_output,
        message,
        time_ms,
        memory_kb: status.memory,
    }
}

/// 一次完整运行的结果
#[derive(Debug)]
pub struct RunOutcome {
    pub report: JudgeReport,
    /// 因评测机不可达而中止，结果不可复用
    pub interrupted: bool,
}

/// 顺序执行全部用例，每个用例结束后回调一次当前报告
pub async fn run_cases<F>(
    client: &dyn JudgeClient,
    template: &ExecutionRequest,
    cases: &[TestCase],
    policy: PollPolicy,
    mut report: JudgeReport,
    mut on_update: F,
) -> RunOutcome
where
    F: FnMut(&JudgeReport),
{
    for (index, case) in cases.iter().enumerate() {
        let request = ExecutionRequest {
            stdin: case.input.clone(),
            expected_output: Some(case.expected_output.clone()),
            ..template.clone()
        };

        let mut interrupted = false;
        let result = match execute_case(client, &request, policy).await {
            Ok(status) => classify(index, case.hidden, status),
            Err(e) => {
                warn!("Judge request for case {} of {} failed: {}", index, report.key, e);
                interrupted = true;
                TestCaseResult::transport_error(index, case.hidden, e.message())
            }
        };

        let stop = result.status == TestCaseStatus::Error;
        report.push(result);

        if stop {
            debug!("Run {} aborted at case {}", report.key, index);
            report.finish(JudgeRunState::Aborted);
            on_update(&report);
            return RunOutcome {
                report,
                interrupted,
            };
        }

        if index + 1 < cases.len() {
            on_update(&report);
        }
    }

    report.finish(JudgeRunState::Finished);
    on_update(&report);
    RunOutcome {
        report,
        interrupted: false,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::judge::client::ExecutionState;

    /// 进程内评测机替身：按提交顺序返回预设状态
    pub struct ScriptedJudge {
        outcomes: Mutex<VecDeque<Result<i64>>>,
        pub submissions: AtomicUsize,
        pub pending_polls: u32,
        polls: Mutex<u32>,
    }

    impl ScriptedJudge {
        pub fn new(outcomes: Vec<Result<i64>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                submissions: AtomicUsize::new(0),
                pending_polls: 0,
                polls: Mutex::new(0),
            }
        }

        pub fn with_pending_polls(mut self, polls: u32) -> Self {
            self.pending_polls = polls;
            self
        }

        pub fn submitted(&self) -> usize {
            self.submissions.load(Ordering::SeqCst)
        }
    }

    pub fn status(id: i64) -> ExecutionStatus {
        ExecutionStatus {
            stdout: Some(format!("out-{id}")),
            stderr: None,
            compile_output: None,
            message: None,
            time: Some("0.010".to_string()),
            memory: Some(2048),
            status: ExecutionState {
                id,
                description: format!("status {id}"),
            },
        }
    }

    #[async_trait]
    impl JudgeClient for ScriptedJudge {
        async fn submit(&self, _request: &ExecutionRequest) -> Result<String> {
            let n = self.submissions.fetch_add(1, Ordering::SeqCst);
            *self.polls.lock().unwrap() = 0;
            Ok(format!("token-{n}"))
        }

        async fn fetch(&self, _token: &str) -> Result<ExecutionStatus> {
            {
                let mut polls = self.polls.lock().unwrap();
                if *polls < self.pending_polls {
                    *polls += 1;
                    return Ok(status(ExecutionStatus::PROCESSING));
                }
            }
            match self.outcomes.lock().unwrap().pop_front() {
                Some(Ok(id)) => Ok(status(id)),
                Some(Err(e)) => Err(e),
                None => Ok(status(ExecutionStatus::ACCEPTED)),
            }
        }
    }

    pub fn template() -> ExecutionRequest {
        ExecutionRequest {
            language_id: 71,
            source_code: "print(input())".to_string(),
            stdin: String::new(),
            expected_output: None,
            cpu_time_limit: 2.0,
            memory_limit: 65536,
        }
    }

    pub fn cases(n: usize) -> Vec<TestCase> {
        (0..n)
            .map(|i| TestCase {
                input: format!("{i}\n"),
                expected_output: format!("{i}\n"),
                hidden: i % 2 == 1,
            })
            .collect()
    }

    pub fn fast_policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_polls: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_classify_status_ids() {
        assert_eq!(classify(0, false, status(3)).status, TestCaseStatus::Passed);
        assert_eq!(classify(0, false, status(4)).status, TestCaseStatus::Failed);
        assert_eq!(classify(0, false, status(5)).status, TestCaseStatus::Error);
        assert_eq!(classify(0, false, status(6)).status, TestCaseStatus::Error);
        assert_eq!(classify(0, false, status(11)).status, TestCaseStatus::Error);

        let result = classify(2, true, status(3));
        assert_eq!(result.index, 2);
        assert!(result.hidden);
        assert_eq!(result.time_ms, Some(10));
        assert_eq!(result.memory_kb, Some(2048));
        assert_eq!(result.message.as_deref(), Some("status 3"));
    }

    #[tokio::test]
    async fn test_all_cases_run_when_wrong_answer() {
        let judge = ScriptedJudge::new(vec![Ok(3), Ok(4), Ok(3)]);
        let mut updates = Vec::new();
        let outcome = run_cases(
            &judge,
            &template(),
            &cases(3),
            fast_policy(),
            JudgeReport::start("k".to_string(), 3),
            |r| updates.push(r.results.len()),
        )
        .await;
        let report = outcome.report;

        assert_eq!(report.state, JudgeRunState::Finished);
        assert_eq!(report.passed, 2);
        assert_eq!(report.results.len(), 3);
        assert_eq!(updates, vec![1, 2, 3]);
        assert_eq!(judge.submitted(), 3);
    }

    #[tokio::test]
    async fn test_error_stops_run() {
        let judge = ScriptedJudge::new(vec![Ok(3), Ok(6), Ok(3)]);
        let outcome = run_cases(
            &judge,
            &template(),
            &cases(3),
            fast_policy(),
            JudgeReport::start("k".to_string(), 3),
            |_| {},
        )
        .await;
        assert!(!outcome.interrupted);
        let report = outcome.report;

        assert_eq!(report.state, JudgeRunState::Aborted);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[1].status, TestCaseStatus::Error);
        assert_eq!(judge.submitted(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_aborts() {
        let judge = ScriptedJudge::new(vec![Err(ClassworkError::judge_connection(
            "connection refused",
        ))]);
        let outcome = run_cases(
            &judge,
            &template(),
            &cases(2),
            fast_policy(),
            JudgeReport::start("k".to_string(), 2),
            |_| {},
        )
        .await;
        assert!(outcome.interrupted);
        let report = outcome.report;

        assert_eq!(report.state, JudgeRunState::Aborted);
        assert_eq!(report.results.len(), 1);
        assert_eq!(
            report.results[0].message.as_deref(),
            Some("connection refused")
        );
    }

    #[tokio::test]
    async fn test_poll_limit_exceeded() {
        let judge = ScriptedJudge::new(vec![Ok(3)]).with_pending_polls(10);
        let err = execute_case(&judge, &template(), fast_policy())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");
    }

    #[tokio::test]
    async fn test_pending_then_done() {
        let judge = ScriptedJudge::new(vec![Ok(4)]).with_pending_polls(2);
        let status = execute_case(&judge, &template(), fast_policy())
            .await
            .unwrap();
        assert_eq!(status.status.id, ExecutionStatus::WRONG_ANSWER);
    }
}
