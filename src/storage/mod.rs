use std::sync::Arc;

use crate::models::{
    courses::{
        entities::Course,
        requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        responses::CourseListResponse,
    },
    enrollments::{
        entities::StudentEnrollment, requests::EnrollmentListQuery,
        responses::EnrollmentListResponse,
    },
    materials::{
        entities::Material,
        requests::{CreateMaterialRequest, UpdateMaterialRequest},
    },
    questions::{
        entities::Question,
        requests::{CreateQuestionRequest, UpdateQuestionRequest},
    },
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 字段已是哈希）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 批量获取用户，不存在的 ID 会被忽略
    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 课程管理方法
    // 创建课程，teacher_id 由服务层确定
    async fn create_course(&self, teacher_id: i64, course: CreateCourseRequest) -> Result<Course>;
    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>>;
    async fn get_course_by_name(&self, name: &str) -> Result<Option<Course>>;
    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse>;
    async fn update_course(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>>;
    // 删除课程及其选课记录、资料和题目
    async fn delete_course(&self, course_id: i64) -> Result<bool>;

    /// 选课管理方法
    async fn get_enrollment(
        &self,
        course_id: i64,
        user_id: i64,
    ) -> Result<Option<StudentEnrollment>>;
    // 在给定用户中筛出已选该课程的
    async fn filter_enrolled_user_ids(&self, course_id: i64, user_ids: &[i64])
    -> Result<Vec<i64>>;
    async fn create_enrollments(
        &self,
        course_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<StudentEnrollment>>;
    async fn delete_enrollment(&self, course_id: i64, user_id: i64) -> Result<bool>;
    async fn list_enrollments_with_pagination(
        &self,
        course_id: i64,
        query: EnrollmentListQuery,
    ) -> Result<EnrollmentListResponse>;

    /// 课程资料方法
    async fn create_material(
        &self,
        course_id: i64,
        created_by: i64,
        material: CreateMaterialRequest,
    ) -> Result<Material>;
    async fn get_material_by_id(&self, material_id: i64) -> Result<Option<Material>>;
    // 按 position、id 排序
    async fn list_materials(&self, course_id: i64, published_only: bool) -> Result<Vec<Material>>;
    async fn update_material(
        &self,
        material_id: i64,
        update: UpdateMaterialRequest,
    ) -> Result<Option<Material>>;
    // 删除资料及其题目
    async fn delete_material(&self, material_id: i64) -> Result<bool>;

    /// 题目方法（details 已由服务层校验）
    async fn create_question(
        &self,
        material_id: i64,
        question: CreateQuestionRequest,
    ) -> Result<Question>;
    async fn get_question_by_id(&self, question_id: i64) -> Result<Option<Question>>;
    async fn list_questions(&self, material_id: i64) -> Result<Vec<Question>>;
    async fn update_question(
        &self,
        question_id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<Question>>;
    async fn delete_question(&self, question_id: i64) -> Result<bool>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
