//! 题目存储操作

use super::SeaOrmStorage;
use crate::entity::questions::{ActiveModel, Column, Entity as Questions};
use crate::errors::{ClassworkError, Result};
use crate::models::questions::{
    entities::Question,
    requests::{CreateQuestionRequest, UpdateQuestionRequest},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

impl SeaOrmStorage {
    async fn next_question_position(&self, material_id: i64) -> Result<i32> {
        let max: Option<Option<i32>> = Questions::find()
            .select_only()
            .column_as(Column::Position.max(), "max_position")
            .filter(Column::MaterialId.eq(material_id))
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询题目位置失败: {e}")))?;

        Ok(max.flatten().map_or(0, |p| p + 1))
    }

    pub async fn create_question_impl(
        &self,
        material_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<Question> {
        let now = chrono::Utc::now().timestamp();
        let position = match req.position {
            Some(position) => position,
            None => self.next_question_position(material_id).await?,
        };

        let model = ActiveModel {
            material_id: Set(material_id),
            kind: Set(req.details.kind().to_string()),
            prompt: Set(req.prompt),
            position: Set(position),
            points: Set(req.points),
            details: Set(serde_json::to_string(&req.details)?),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("创建题目失败: {e}")))?;

        result.into_question()
    }

    pub async fn get_question_by_id_impl(&self, question_id: i64) -> Result<Option<Question>> {
        let result = Questions::find_by_id(question_id)
            .one(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询题目失败: {e}")))?;

        result.map(|m| m.into_question()).transpose()
    }

    pub async fn list_questions_impl(&self, material_id: i64) -> Result<Vec<Question>> {
        let result = Questions::find()
            .filter(Column::MaterialId.eq(material_id))
            .order_by_asc(Column::Position)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询题目列表失败: {e}")))?;

        result.into_iter().map(|m| m.into_question()).collect()
    }

    pub async fn update_question_impl(
        &self,
        question_id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<Question>> {
        let existing = self.get_question_by_id_impl(question_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(question_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(prompt) = update.prompt {
            model.prompt = Set(prompt);
        }
        if let Some(position) = update.position {
            model.position = Set(position);
        }
        if let Some(points) = update.points {
            model.points = Set(points);
        }
        if let Some(details) = update.details {
            model.kind = Set(details.kind().to_string());
            model.details = Set(serde_json::to_string(&details)?);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("更新题目失败: {e}")))?;

        result.into_question().map(Some)
    }

    pub async fn delete_question_impl(&self, question_id: i64) -> Result<bool> {
        let result = Questions::delete_by_id(question_id)
            .exec(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("删除题目失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, seed_user};
    use crate::models::courses::requests::CreateCourseRequest;
    use crate::models::materials::requests::CreateMaterialRequest;
    use crate::models::questions::entities::{QuestionDetails, TestCase};
    use crate::models::questions::requests::{CreateQuestionRequest, UpdateQuestionRequest};
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_question_details_roundtrip_and_cascade() {
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
        let material = storage
            .create_material_impl(
                course.id,
                teacher.id,
                CreateMaterialRequest {
                    title: "Week 1".to_string(),
                    content: String::new(),
                    position: None,
                    is_published: true,
                },
            )
            .await
            .unwrap();

        let coding = QuestionDetails::Coding {
            language: "python".to_string(),
            starter_code: "print()".to_string(),
            time_limit_ms: Some(2000),
            memory_limit_kb: None,
            test_cases: vec![TestCase {
                input: "1 2".to_string(),
                expected_output: "3".to_string(),
                hidden: true,
            }],
        };
        let created = storage
            .create_question_impl(
                material.id,
                CreateQuestionRequest {
                    prompt: "Add two numbers".to_string(),
                    position: None,
                    points: 10.0,
                    details: coding.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.details, coding);
        assert_eq!(created.position, 0);

        let replaced = QuestionDetails::ShortAnswer {
            reference_answer: Some("O(n)".to_string()),
        };
        let updated = storage
            .update_question_impl(
                created.id,
                UpdateQuestionRequest {
                    details: Some(replaced.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.details, replaced);
        assert_eq!(updated.prompt, "Add two numbers");

        // 删除课程会删除资料下的题目
        assert!(storage.delete_course_impl(course.id).await.unwrap());
        assert!(
            storage
                .get_question_by_id_impl(created.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(storage.list_questions_impl(material.id).await.unwrap().is_empty());
    }
}
