use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Column, Entity as Users, Model};
use crate::errors::{ClassworkError, Result};
use crate::models::{
    PaginationInfo,
    users::{
        entities::{User, UserStatus},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set, sea_query::Expr,
};

fn user_db_error(action: &'static str) -> impl FnOnce(DbErr) -> ClassworkError {
    move |e| ClassworkError::database_operation(format!("{action}失败: {e}"))
}

// 搜索、角色、状态三个可选条件
fn apply_list_filters(mut select: Select<Users>, query: &UserListQuery) -> Select<Users> {
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = escape_like_pattern(search);
        select = select.filter(
            Condition::any()
                .add(Column::Username.contains(&pattern))
                .add(Column::Email.contains(&pattern))
                .add(Column::DisplayName.contains(&pattern)),
        );
    }
    if let Some(role) = &query.role {
        select = select.filter(Column::Role.eq(role.to_string()));
    }
    if let Some(status) = &query.status {
        select = select.filter(Column::Status.eq(status.to_string()));
    }
    select
}

impl SeaOrmStorage {
    async fn find_user(&self, condition: Condition) -> Result<Option<User>> {
        Ok(Users::find()
            .filter(condition)
            .one(&self.db)
            .await
            .map_err(user_db_error("查询用户"))?
            .map(Model::into_user))
    }

    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();
        ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            display_name: Set(req.display_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map(Model::into_user)
        .map_err(user_db_error("创建用户"))
    }

    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        self.find_user(Condition::all().add(Column::Id.eq(id))).await
    }

    pub async fn get_users_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = Users::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(user_db_error("批量查询用户"))?;
        Ok(models.into_iter().map(Model::into_user).collect())
    }

    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        self.find_user(Condition::all().add(Column::Username.eq(username)))
            .await
    }

    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        self.find_user(Condition::all().add(Column::Email.eq(email)))
            .await
    }

    /// 登录时使用，标识可以是用户名或邮箱
    pub async fn get_user_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        self.find_user(
            Condition::any()
                .add(Column::Username.eq(identifier))
                .add(Column::Email.eq(identifier)),
        )
        .await
    }

    /// 按创建时间倒序分页，每页 1..=100 条
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let paginator = apply_list_filters(Users::find(), &query)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let counts = paginator
            .num_items_and_pages()
            .await
            .map_err(user_db_error("统计用户"))?;
        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(user_db_error("查询用户列表"))?;

        Ok(UserListResponse {
            items: models.into_iter().map(Model::into_user).collect(),
            pagination: PaginationInfo::new(
                page,
                size,
                counts.number_of_items,
                counts.number_of_pages,
            ),
        })
    }

    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(Column::LastLogin, Expr::value(chrono::Utc::now().timestamp()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(user_db_error("更新最后登录时间"))?;
        Ok(result.rows_affected > 0)
    }

    /// 只写入请求中出现的字段；display_name 传空串表示清除
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        let Some(existing) = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(user_db_error("查询用户"))?
        else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        if let Some(email) = update.email {
            model.email = Set(email);
        }
        if let Some(hash) = update.password {
            model.password_hash = Set(hash);
        }
        if let Some(role) = update.role {
            model.role = Set(role.to_string());
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }
        if let Some(display_name) = update.display_name {
            let display_name = display_name.trim();
            model.display_name = Set(Some(display_name.to_string()).filter(|s| !s.is_empty()));
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        model
            .update(&self.db)
            .await
            .map(|m| Some(m.into_user()))
            .map_err(user_db_error("更新用户"))
    }

    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(user_db_error("删除用户"))?;
        Ok(result.rows_affected > 0)
    }

    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find()
            .count(&self.db)
            .await
            .map_err(user_db_error("统计用户数量"))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, seed_user};
    use crate::models::users::{
        entities::{UserRole, UserStatus},
        requests::{UpdateUserRequest, UserListQuery},
    };

    #[tokio::test]
    async fn test_lookup_by_username_or_email() {
        let storage = memory_storage().await;
        let user = seed_user(&storage, "alice", UserRole::Student).await;

        let by_name = storage
            .get_user_by_username_or_email_impl("alice")
            .await
            .unwrap();
        let by_email = storage
            .get_user_by_username_or_email_impl("alice@example.com")
            .await
            .unwrap();
        assert_eq!(by_name.map(|u| u.id), Some(user.id));
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
        assert_eq!(user.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let storage = memory_storage().await;
        seed_user(&storage, "alice", UserRole::Student).await;
        let dup = storage
            .create_user_impl(crate::models::users::requests::CreateUserRequest {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password: "hash".to_string(),
                role: UserRole::Student,
                display_name: None,
            })
            .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_list_filters_by_role() {
        let storage = memory_storage().await;
        seed_user(&storage, "alice", UserRole::Student).await;
        seed_user(&storage, "bobby", UserRole::Student).await;
        seed_user(&storage, "tessa", UserRole::Teacher).await;

        let students = storage
            .list_users_with_pagination_impl(UserListQuery {
                role: Some(UserRole::Student),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(students.pagination.total, 2);

        let searched = storage
            .list_users_with_pagination_impl(UserListQuery {
                search: Some("tes".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.items.len(), 1);
        assert_eq!(searched.items[0].username, "tessa");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let storage = memory_storage().await;
        let user = seed_user(&storage, "alice", UserRole::Student).await;

        let updated = storage
            .update_user_impl(
                user.id,
                UpdateUserRequest {
                    status: Some(UserStatus::Suspended),
                    display_name: Some("Alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, UserStatus::Suspended);
        assert_eq!(updated.display_name.as_deref(), Some("Alice"));

        assert!(
            storage
                .update_user_impl(9999, UpdateUserRequest::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(storage.delete_user_impl(user.id).await.unwrap());
        assert!(!storage.delete_user_impl(user.id).await.unwrap());
        assert_eq!(storage.count_users_impl().await.unwrap(), 0);
    }
}
