use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    // 授课教师
    pub teacher_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 当前用户访问某门课程的身份，由课程权限中间件写入请求扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub enum CourseAccess {
    Admin,
    Instructor,
    Student,
}

impl CourseAccess {
    /// 可修改课程、资料、题目和选课名单
    pub fn can_manage(&self) -> bool {
        matches!(self, CourseAccess::Admin | CourseAccess::Instructor)
    }
}

impl std::fmt::Display for CourseAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CourseAccess::Admin => write!(f, "admin"),
            CourseAccess::Instructor => write!(f, "instructor"),
            CourseAccess::Student => write!(f, "student"),
        }
    }
}
