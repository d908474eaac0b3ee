use super::entities::EnrolledStudent;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct EnrollmentListResponse {
    pub items: Vec<EnrolledStudent>,
    pub pagination: PaginationInfo,
}

/// 批量选课结果
#[derive(Debug, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct EnrollStudentsResponse {
    pub enrolled: Vec<i64>,
    /// 已在课程中
    pub skipped: Vec<i64>,
    /// 不存在或不是学生
    pub invalid: Vec<i64>,
}
