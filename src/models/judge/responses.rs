use super::entities::TestCaseResult;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/judge.ts")]
pub struct RunResponse {
    pub result: TestCaseResult,
}
