use serde::Deserialize;
use ts_rs::TS;

/// 提交编程题评测，language 为空时使用题目语言
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/judge.ts")]
pub struct JudgeRequest {
    pub language: Option<String>,
    pub source_code: String,
}

/// 自定义输入试运行
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/judge.ts")]
pub struct RunRequest {
    pub language: Option<String>,
    pub source_code: String,
    #[serde(default)]
    pub stdin: String,
}
