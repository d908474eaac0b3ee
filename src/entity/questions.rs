//! 题目实体
//!
//! 公共字段存为普通列，题型相关字段以 JSON 存入 `details`，`kind` 列冗余保存题型标签便于筛选。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub material_id: i64,
    pub kind: String,
    #[sea_orm(column_type = "Text")]
    pub prompt: String,
    pub position: i32,
    pub points: f64,
    #[sea_orm(column_type = "Text")]
    pub details: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::materials::Entity",
        from = "Column::MaterialId",
        to = "super::materials::Column::Id"
    )]
    Material,
}

impl Related<super::materials::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_question(self) -> crate::errors::Result<crate::models::questions::entities::Question> {
        use crate::errors::ClassworkError;
        use crate::models::questions::entities::{Question, QuestionDetails};
        use chrono::{DateTime, Utc};

        let details: QuestionDetails = serde_json::from_str(&self.details).map_err(|e| {
            ClassworkError::serialization(format!(
                "Corrupted details for question {}: {e}",
                self.id
            ))
        })?;

        Ok(Question {
            id: self.id,
            material_id: self.material_id,
            prompt: self.prompt,
            position: self.position,
            points: self.points,
            details,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}
