use super::entities::QuestionDetails;
use serde::Deserialize;
use ts_rs::TS;

fn default_points() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question.ts")]
pub struct CreateQuestionRequest {
    pub prompt: String,
    pub position: Option<i32>,
    #[serde(default = "default_points")]
    pub points: f64,
    pub details: QuestionDetails,
}

/// details 整体替换并重新校验
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question.ts")]
pub struct UpdateQuestionRequest {
    pub prompt: Option<String>,
    pub position: Option<i32>,
    pub points: Option<f64>,
    pub details: Option<QuestionDetails>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/question.ts")]
pub struct CheckAnswerRequest {
    pub selected: Vec<usize>,
}
