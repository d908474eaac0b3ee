pub mod auth;
pub mod common;
pub mod courses;
pub mod enrollments;
pub mod judge;
pub mod materials;
pub mod questions;
pub mod users;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

/// 业务错误码，随 `ApiResponse.code` 返回给前端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1002,
    NotFound = 1003,
    InternalServerError = 1004,
    RateLimitExceeded = 1005,

    // 认证 1100-1199
    AuthFailed = 1100,
    RegisterFailed = 1101,
    UserSuspended = 1102,

    // 用户 2000-2099
    UserNotFound = 2000,
    UserAlreadyExists = 2001,
    UserNameInvalid = 2002,
    UserEmailInvalid = 2003,
    UserPasswordInvalid = 2004,
    UserNameAlreadyExists = 2005,
    UserEmailAlreadyExists = 2006,
    UserCreationFailed = 2007,
    UserUpdateFailed = 2008,
    UserDeleteFailed = 2009,
    CanNotDeleteCurrentUser = 2010,
    UserStillTeaching = 2011,

    // 课程 3000-3099
    CourseNotFound = 3000,
    CourseAlreadyExists = 3001,
    CourseNameInvalid = 3002,
    CoursePermissionDenied = 3003,
    CourseCreationFailed = 3004,
    CourseUpdateFailed = 3005,
    CourseDeleteFailed = 3006,
    CourseTeacherInvalid = 3007,

    // 选课 3100-3199
    EnrollmentNotFound = 3100,
    EnrollmentFailed = 3101,

    // 资料 4000-4099
    MaterialNotFound = 4000,
    MaterialTitleInvalid = 4001,
    MaterialCreationFailed = 4002,
    MaterialUpdateFailed = 4003,
    MaterialDeleteFailed = 4004,

    // 题目 5000-5099
    QuestionNotFound = 5000,
    QuestionInvalid = 5001,
    QuestionCreationFailed = 5002,
    QuestionUpdateFailed = 5003,
    QuestionDeleteFailed = 5004,
    QuestionKindMismatch = 5005,

    // 评测 6000-6099
    JudgeUnavailable = 6000,
    JudgeLanguageUnsupported = 6001,
    JudgeResultNotFound = 6002,
    JudgeFailed = 6003,
}
