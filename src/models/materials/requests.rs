use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/material.ts")]
pub struct CreateMaterialRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// 为空时排在课程最后
    pub position: Option<i32>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/material.ts")]
pub struct UpdateMaterialRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub position: Option<i32>,
    pub is_published: Option<bool>,
}
