//! 评测代理
//!
//! 把编程题提交转发给外部评测机，按用例顺序执行并通过流式结果返回，
//! 相同提交的结果在内存中缓存。
//!
//! ## 流程
//!
//! 1. 提交内容生成缓存键（见 [`key::submission_key`]），调用方只拿到键的摘要句柄
//! 2. 缓存中已结束的结果直接返回；运行中的结果由调用方跟随轮询
//! 3. 否则启动新的运行任务，每个用例结束后写缓存并推送快照
//!
//! 运行任务独立于 HTTP 连接，客户端断开后仍会跑完并更新缓存。

pub mod cache;
pub mod client;
pub mod key;
pub mod pipeline;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::JudgeConfig;
use crate::errors::{ClassworkError, Result};
use crate::models::judge::entities::{
    JudgeReport, JudgeRunState, JudgeSubmission, TestCaseResult,
};

use cache::{Begin, JudgeCache};
use client::{ExecutionRequest, Judge0Client, JudgeClient};
use pipeline::{PollPolicy, classify, execute_case, run_cases};

pub type ReportReceiver = mpsc::UnboundedReceiver<JudgeReport>;

pub struct JudgeEngine {
    client: Arc<dyn JudgeClient>,
    cache: JudgeCache,
    policy: PollPolicy,
    default_time_limit_ms: u64,
    default_memory_limit_kb: u64,
    languages: HashMap<String, i64>,
}

impl JudgeEngine {
    /// 使用 HTTP 评测机客户端创建
    pub fn from_config(config: &JudgeConfig) -> Result<Self> {
        let client = Judge0Client::new(config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn new(client: Arc<dyn JudgeClient>, config: &JudgeConfig) -> Self {
        let languages = config
            .languages
            .iter()
            .map(|(name, id)| (name.to_ascii_lowercase(), *id))
            .collect();

        Self {
            client,
            cache: JudgeCache::new(Duration::from_secs(config.cache_ttl_secs)),
            policy: PollPolicy {
                interval: Duration::from_millis(config.poll_interval_ms),
                max_polls: config.max_polls,
            },
            default_time_limit_ms: config.default_time_limit_ms,
            default_memory_limit_kb: config.default_memory_limit_kb,
            languages,
        }
    }

    pub fn language_id(&self, language: &str) -> Result<i64> {
        self.languages
            .get(&language.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| ClassworkError::unsupported_language(language.to_string()))
    }

    pub fn supports(&self, language: &str) -> bool {
        self.language_id(language).is_ok()
    }

    /// 按句柄读取缓存的评测报告
    pub fn result(&self, handle: &str) -> Option<JudgeReport> {
        self.cache.lookup(handle)
    }

    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        self.cache.spawn_cleanup(interval)
    }

    fn request_template(
        &self,
        language_id: i64,
        source_code: String,
        time_limit_ms: Option<u64>,
        memory_limit_kb: Option<u64>,
    ) -> ExecutionRequest {
        let time_limit_ms = time_limit_ms.unwrap_or(self.default_time_limit_ms);
        ExecutionRequest {
            language_id,
            source_code,
            stdin: String::new(),
            expected_output: None,
            cpu_time_limit: time_limit_ms as f64 / 1000.0,
            memory_limit: memory_limit_kb.unwrap_or(self.default_memory_limit_kb),
        }
    }

    /// 提交评测，返回结果句柄和报告快照流
    ///
    /// 流的最后一行总是终态报告；跟随的运行被中止并移出缓存时补发一行 `aborted`。
    pub fn submit(
        self: &Arc<Self>,
        submission: JudgeSubmission,
    ) -> Result<(String, ReportReceiver)> {
        let language_id = self.language_id(&submission.language)?;
        let key = key::submission_key(&submission)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = match self.cache.begin(&key, submission.test_cases.len()) {
            Begin::Existing(report) if report.state.is_terminal() => {
                debug!("Judge cache hit for {}", report.key);
                let handle = report.key.clone();
                let _ = tx.send(report);
                handle
            }
            Begin::Existing(report) => {
                debug!("Following running judge task {}", report.key);
                let handle = report.key.clone();
                self.spawn_follower(key, report, tx);
                handle
            }
            Begin::Started(report) => {
                let handle = report.key.clone();
                let _ = tx.send(report.clone());
                self.spawn_run(key, submission, language_id, report, tx);
                handle
            }
        };

        Ok((handle, rx))
    }

    fn spawn_run(
        self: &Arc<Self>,
        key: String,
        submission: JudgeSubmission,
        language_id: i64,
        report: JudgeReport,
        tx: mpsc::UnboundedSender<JudgeReport>,
    ) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let template = engine.request_template(
                language_id,
                submission.source_code.clone(),
                submission.time_limit_ms,
                submission.memory_limit_kb,
            );
            let cache = engine.cache.clone();

            let outcome = run_cases(
                engine.client.as_ref(),
                &template,
                &submission.test_cases,
                engine.policy,
                report,
                |snapshot| {
                    cache.put(&key, snapshot.clone());
                    // 客户端断开后继续运行
                    let _ = tx.send(snapshot.clone());
                },
            )
            .await;

            let report = outcome.report;
            if outcome.interrupted {
                engine.cache.remove(&key);
            }
            info!(
                "Judge run {} ended {:?}: {}/{} passed",
                report.key, report.state, report.passed, report.total
            );
        });
    }

    /// 轮询缓存跟随他人发起的运行
    ///
    /// 条目在终态之前消失说明运行被中止并已移出缓存，此时以最后看到的快照补发 `aborted`。
    fn spawn_follower(
        &self,
        key: String,
        initial: JudgeReport,
        tx: mpsc::UnboundedSender<JudgeReport>,
    ) {
        let cache = self.cache.clone();
        let interval = self.policy.interval;

        tokio::spawn(async move {
            let mut last = initial.clone();
            if tx.send(initial).is_err() {
                return;
            }

            loop {
                tokio::time::sleep(interval).await;
                let Some(report) = cache.get(&key) else {
                    debug!("Followed judge task {} evicted before finishing", last.key);
                    last.finish(JudgeRunState::Aborted);
                    let _ = tx.send(last);
                    break;
                };

                let terminal = report.state.is_terminal();
                let changed = report.state != last.state
                    || report.results.len() != last.results.len();
                last = report;
                if changed && tx.send(last.clone()).is_err() {
                    break;
                }
                if terminal {
                    break;
                }
            }
        });
    }

    /// 自定义输入运行一次，不比较输出也不缓存
    pub async fn run_once(
        &self,
        language: &str,
        source_code: String,
        stdin: String,
        time_limit_ms: Option<u64>,
        memory_limit_kb: Option<u64>,
    ) -> Result<TestCaseResult> {
        let language_id = self.language_id(language)?;
        let request = ExecutionRequest {
            stdin,
            ..self.request_template(language_id, source_code, time_limit_ms, memory_limit_kb)
        };
        let status = execute_case(self.client.as_ref(), &request, self.policy).await?;
        Ok(classify(0, false, status))
    }
}
