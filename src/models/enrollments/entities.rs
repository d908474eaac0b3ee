use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::User;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct StudentEnrollment {
    pub id: i64,
    pub course_id: i64,
    pub user_id: i64,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
}

/// 选课记录及学生公开信息
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct EnrolledStudent {
    #[serde(flatten)]
    #[ts(flatten)]
    pub enrollment: StudentEnrollment,
    pub user: User,
}
