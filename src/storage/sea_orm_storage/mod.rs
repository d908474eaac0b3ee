//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod courses;
mod enrollments;
mod materials;
mod questions;
mod users;

use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::{ClassworkError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Sqlite,
    Server, // PostgreSQL / MySQL / MariaDB
}

/// 由配置的 URL 推断后端；裸 `.db`/`.sqlite` 路径视为 SQLite 文件
fn resolve_database_url(raw: &str) -> Result<(Backend, String)> {
    let scheme = raw.split_once("://").map(|(scheme, _)| scheme);
    match scheme {
        Some("sqlite") => Ok((Backend::Sqlite, raw.to_string())),
        Some("postgres" | "postgresql" | "mysql" | "mariadb") => {
            Ok((Backend::Server, raw.to_string()))
        }
        None if raw == ":memory:" || raw.ends_with(".db") || raw.ends_with(".sqlite") => {
            Ok((Backend::Sqlite, format!("sqlite://{raw}?mode=rwc")))
        }
        _ => Err(ClassworkError::database_config(format!(
            "无法识别的数据库 URL: {raw}（支持 sqlite://、postgres://、mysql:// 或 .db/.sqlite 文件）"
        ))),
    }
}

#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    pub async fn new_async() -> Result<Self> {
        let database = &AppConfig::get().database;
        let (backend, url) = resolve_database_url(&database.url)?;

        let db = match backend {
            Backend::Sqlite => Self::connect_sqlite(&url, database).await?,
            Backend::Server => Self::connect_server(&url, database).await?,
        };

        let storage = Self::from_connection(db).await?;
        info!("Database ready ({:?})", backend);
        Ok(storage)
    }

    /// 在给定连接上执行迁移
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("数据库迁移失败: {e}")))?;
        Ok(Self { db })
    }

    // WAL 模式，外键约束必须打开才能级联删除
    async fn connect_sqlite(url: &str, database: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| ClassworkError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(database.pool_size.max(1))
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(options)
            .await
            .map_err(|e| ClassworkError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    async fn connect_server(url: &str, database: &DatabaseConfig) -> Result<DatabaseConnection> {
        let timeout = Duration::from_secs(database.timeout);
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(database.pool_size.max(1))
            .min_connections(database.pool_size.clamp(1, 5))
            .connect_timeout(timeout)
            .acquire_timeout(timeout)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(options)
            .await
            .map_err(|e| ClassworkError::database_connection(format!("无法连接到数据库: {e}")))
    }
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>> {
        self.get_users_by_ids_impl(ids).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 课程模块
    async fn create_course(&self, teacher_id: i64, course: CreateCourseRequest) -> Result<Course> {
        self.create_course_impl(teacher_id, course).await
    }

    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(course_id).await
    }

    async fn get_course_by_name(&self, name: &str) -> Result<Option<Course>> {
        self.get_course_by_name_impl(name).await
    }

    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        self.list_courses_with_pagination_impl(query).await
    }

    async fn update_course(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        self.update_course_impl(course_id, update).await
    }

    async fn delete_course(&self, course_id: i64) -> Result<bool> {
        self.delete_course_impl(course_id).await
    }

    // 选课模块
    async fn get_enrollment(
        &self,
        course_id: i64,
        user_id: i64,
    ) -> Result<Option<StudentEnrollment>> {
        self.get_enrollment_impl(course_id, user_id).await
    }

    async fn filter_enrolled_user_ids(
        &self,
        course_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<i64>> {
        self.filter_enrolled_user_ids_impl(course_id, user_ids).await
    }

    async fn create_enrollments(
        &self,
        course_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<StudentEnrollment>> {
        self.create_enrollments_impl(course_id, user_ids).await
    }

    async fn delete_enrollment(&self, course_id: i64, user_id: i64) -> Result<bool> {
        self.delete_enrollment_impl(course_id, user_id).await
    }

    async fn list_enrollments_with_pagination(
        &self,
        course_id: i64,
        query: EnrollmentListQuery,
    ) -> Result<EnrollmentListResponse> {
        self.list_enrollments_with_pagination_impl(course_id, query)
            .await
    }

    // 资料模块
    async fn create_material(
        &self,
        course_id: i64,
        created_by: i64,
        material: CreateMaterialRequest,
    ) -> Result<Material> {
        self.create_material_impl(course_id, created_by, material)
            .await
    }

    async fn get_material_by_id(&self, material_id: i64) -> Result<Option<Material>> {
        self.get_material_by_id_impl(material_id).await
    }

    async fn list_materials(&self, course_id: i64, published_only: bool) -> Result<Vec<Material>> {
        self.list_materials_impl(course_id, published_only).await
    }

    async fn update_material(
        &self,
        material_id: i64,
        update: UpdateMaterialRequest,
    ) -> Result<Option<Material>> {
        self.update_material_impl(material_id, update).await
    }

    async fn delete_material(&self, material_id: i64) -> Result<bool> {
        self.delete_material_impl(material_id).await
    }

    // 题目模块
    async fn create_question(
        &self,
        material_id: i64,
        question: CreateQuestionRequest,
    ) -> Result<Question> {
        self.create_question_impl(material_id, question).await
    }

    async fn get_question_by_id(&self, question_id: i64) -> Result<Option<Question>> {
        self.get_question_by_id_impl(question_id).await
    }

    async fn list_questions(&self, material_id: i64) -> Result<Vec<Question>> {
        self.list_questions_impl(material_id).await
    }

    async fn update_question(
        &self,
        question_id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<Question>> {
        self.update_question_impl(question_id, update).await
    }

    async fn delete_question(&self, question_id: i64) -> Result<bool> {
        self.delete_question_impl(question_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_database_url() {
        assert_eq!(
            resolve_database_url("classwork.db").unwrap(),
            (Backend::Sqlite, "sqlite://classwork.db?mode=rwc".to_string())
        );
        assert_eq!(
            resolve_database_url("sqlite://data/app.sqlite").unwrap().0,
            Backend::Sqlite
        );
        assert_eq!(
            resolve_database_url("postgres://u:p@db/classwork").unwrap().0,
            Backend::Server
        );
        assert!(resolve_database_url("redis://localhost").is_err());
        assert!(resolve_database_url("classwork").is_err());
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SeaOrmStorage;
    use crate::models::users::{entities::User, entities::UserRole, requests::CreateUserRequest};
    use sea_orm::{ConnectOptions, Database};

    /// 内存 SQLite，已运行迁移；单连接保证所有查询落在同一个库上
    pub async fn memory_storage() -> SeaOrmStorage {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        SeaOrmStorage::from_connection(db).await.unwrap()
    }

    pub async fn seed_user(storage: &SeaOrmStorage, username: &str, role: UserRole) -> User {
        storage
            .create_user_impl(CreateUserRequest {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password: "hash".to_string(),
                role,
                display_name: None,
            })
            .await
            .unwrap()
    }
}
