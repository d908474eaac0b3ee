use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 课程查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

// 创建课程请求
//
// # teacher_id 字段说明
// - **教师创建**：可选字段，不填写则使用当前登录教师的 ID，填写时必须等于自己的 ID
// - **管理员创建**：必填字段，且该用户必须是教师角色
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CreateCourseRequest {
    pub teacher_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
}

// 更新课程请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// 课程列表查询参数（用于存储层），teacher_id 与 student_id 同时为空时返回全部
#[derive(Debug, Clone, Default)]
pub struct CourseListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub teacher_id: Option<i64>,
    pub student_id: Option<i64>,
    pub search: Option<String>,
}
