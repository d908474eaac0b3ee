use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web::Bytes};
use futures_util::stream;
use tracing::{error, info};

use super::{JudgeService, coding_task, judge_error_response};
use crate::judge::ReportReceiver;
use crate::models::{
    courses::entities::CourseAccess,
    judge::{entities::JudgeSubmission, requests::JudgeRequest},
};
use crate::services::{courses::current_course, questions::question_in_course};

pub const NDJSON: &str = "application/x-ndjson";

/// 报告快照编码为一行 JSON
fn encode_line(report: &crate::models::judge::entities::JudgeReport) -> serde_json::Result<Bytes> {
    let mut line = serde_json::to_vec(report)?;
    line.push(b'\n');
    Ok(Bytes::from(line))
}

/// 把报告通道转换为 NDJSON 字节流，学生看不到隐藏用例的输出
pub(crate) fn ndjson_stream(
    rx: ReportReceiver,
    redact: bool,
) -> impl futures_util::Stream<Item = Result<Bytes, actix_web::Error>> {
    stream::unfold(rx, move |mut rx| async move {
        let report = rx.recv().await?;
        let report = if redact { report.redact_hidden() } else { report };
        match encode_line(&report) {
            Ok(line) => Some((Ok(line), rx)),
            Err(e) => {
                error!("Failed to encode judge report {}: {}", report.key, e);
                None
            }
        }
    })
}

pub async fn judge_submission(
    service: &JudgeService,
    request: &HttpRequest,
    question_id: i64,
    body: JudgeRequest,
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

    let submission = JudgeSubmission {
        language: task.language,
        source_code: body.source_code,
        test_cases: task.test_cases,
        time_limit_ms: task.time_limit_ms,
        memory_limit_kb: task.memory_limit_kb,
    };

    let (handle, rx) = match engine.submit(submission) {
        Ok(submitted) => submitted,
        Err(e) => return Ok(judge_error_response(e)),
    };
    info!(
        "Judge submission for question {} in course {}: {}",
        question_id, course.id, handle
    );

    let redact = access == CourseAccess::Student;
    Ok(HttpResponse::Ok()
        .content_type(NDJSON)
        .insert_header(("X-Judge-Key", handle))
        .streaming(ndjson_stream(rx, redact)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::judge::entities::{JudgeReport, TestCaseResult, TestCaseStatus};
    use futures_util::StreamExt;
    use tokio::sync::mpsc;

    fn hidden_failure() -> TestCaseResult {
        TestCaseResult {
            index: 0,
            status: TestCaseStatus::Failed,
            hidden: true,
            stdout: Some("secret".to_string()),
            stderr: None,
            compile_output: None,
            message: Some("Wrong Answer".to_string()),
            time_ms: Some(4),
            memory_kb: Some(512),
        }
    }

    #[tokio::test]
    async fn test_stream_emits_one_line_per_snapshot() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut report = JudgeReport::start("abc".to_string(), 1);
        tx.send(report.clone()).unwrap();
        report.push(hidden_failure());
        tx.send(report).unwrap();
        drop(tx);

        let lines: Vec<Bytes> = ndjson_stream(rx, true)
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.ends_with(b"\n")));

        let last: serde_json::Value = serde_json::from_slice(&lines[1]).unwrap();
        assert_eq!(last["results"][0]["status"], "failed");
        assert!(last["results"][0].get("stdout").is_none());
    }

    #[tokio::test]
    async fn test_stream_keeps_output_for_staff() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut report = JudgeReport::start("abc".to_string(), 1);
        report.push(hidden_failure());
        tx.send(report).unwrap();
        drop(tx);

        let lines: Vec<Bytes> = ndjson_stream(rx, false)
            .map(|item| item.unwrap())
            .collect()
            .await;
        let line: serde_json::Value = serde_json::from_slice(&lines[0]).unwrap();
        assert_eq!(line["results"][0]["stdout"], "secret");
    }
}
