//! 课程资料存储操作

use super::SeaOrmStorage;
use crate::entity::materials::{ActiveModel, Column, Entity as Materials};
use crate::entity::prelude::Questions;
use crate::entity::questions;
use crate::errors::{ClassworkError, Result};
use crate::models::materials::{
    entities::Material,
    requests::{CreateMaterialRequest, UpdateMaterialRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

impl SeaOrmStorage {
    /// 课程内下一个空闲位置
    async fn next_material_position(&self, course_id: i64) -> Result<i32> {
        let max: Option<Option<i32>> = Materials::find()
            .select_only()
            .column_as(Column::Position.max(), "max_position")
            .filter(Column::CourseId.eq(course_id))
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询资料位置失败: {e}")))?;

        Ok(max.flatten().map_or(0, |p| p + 1))
    }

    pub async fn create_material_impl(
        &self,
        course_id: i64,
        created_by: i64,
        req: CreateMaterialRequest,
    ) -> Result<Material> {
        let now = chrono::Utc::now().timestamp();
        let position = match req.position {
            Some(position) => position,
            None => self.next_material_position(course_id).await?,
        };

        let model = ActiveModel {
            course_id: Set(course_id),
            title: Set(req.title.trim().to_string()),
            content: Set(req.content),
            position: Set(position),
            is_published: Set(req.is_published),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("创建资料失败: {e}")))?;

        Ok(result.into_material())
    }

    pub async fn get_material_by_id_impl(&self, material_id: i64) -> Result<Option<Material>> {
        let result = Materials::find_by_id(material_id)
            .one(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询资料失败: {e}")))?;

        Ok(result.map(|m| m.into_material()))
    }

    pub async fn list_materials_impl(
        &self,
        course_id: i64,
        published_only: bool,
    ) -> Result<Vec<Material>> {
        let mut select = Materials::find().filter(Column::CourseId.eq(course_id));
        if published_only {
            select = select.filter(Column::IsPublished.eq(true));
        }

        let result = select
            .order_by_asc(Column::Position)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询资料列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_material()).collect())
    }

    pub async fn update_material_impl(
        &self,
        material_id: i64,
        update: UpdateMaterialRequest,
    ) -> Result<Option<Material>> {
        let existing = self.get_material_by_id_impl(material_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(material_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title.trim().to_string());
        }
        if let Some(content) = update.content {
            model.content = Set(content);
        }
        if let Some(position) = update.position {
            model.position = Set(position);
        }
        if let Some(is_published) = update.is_published {
            model.is_published = Set(is_published);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("更新资料失败: {e}")))?;

        Ok(Some(result.into_material()))
    }

    /// 删除资料及其题目
    pub async fn delete_material_impl(&self, material_id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("开启事务失败: {e}")))?;

        Questions::delete_many()
            .filter(questions::Column::MaterialId.eq(material_id))
            .exec(&txn)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("删除题目失败: {e}")))?;

        let result = Materials::delete_by_id(material_id)
            .exec(&txn)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("删除资料失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, seed_user};
    use crate::models::courses::requests::CreateCourseRequest;
    use crate::models::materials::requests::{CreateMaterialRequest, UpdateMaterialRequest};
    use crate::models::users::entities::UserRole;

    fn material(title: &str, position: Option<i32>, is_published: bool) -> CreateMaterialRequest {
        CreateMaterialRequest {
            title: title.to_string(),
            content: "# notes".to_string(),
            position,
            is_published,
        }
    }

    #[tokio::test]
    async fn test_positions_and_published_filter() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "tessa", UserRole::Teacher).await;
        let course = storage
            .create_course_impl(
                teacher.id,
                CreateCourseRequest {
                    teacher_id: None,
                    name: "Course".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let first = storage
            .create_material_impl(course.id, teacher.id, material("A", None, true))
            .await
            .unwrap();
        let second = storage
            .create_material_impl(course.id, teacher.id, material("B", None, false))
            .await
            .unwrap();
        let pinned = storage
            .create_material_impl(course.id, teacher.id, material("C", Some(0), true))
            .await
            .unwrap();
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);

        // position 相同按 id 排序
        let all = storage.list_materials_impl(course.id, false).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![first.id, pinned.id, second.id]);

        let published = storage.list_materials_impl(course.id, true).await.unwrap();
        assert_eq!(published.len(), 2);
        assert!(published.iter().all(|m| m.is_published));

        let updated = storage
            .update_material_impl(
                second.id,
                UpdateMaterialRequest {
                    is_published: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_published);
        assert_eq!(updated.title, "B");

        assert!(storage.delete_material_impl(second.id).await.unwrap());
        assert!(
            storage
                .get_material_by_id_impl(second.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
