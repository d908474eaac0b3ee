//! 选课存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::prelude::Users;
use crate::entity::student_enrollments::{ActiveModel, Column, Entity as StudentEnrollments};
use crate::entity::users;
use crate::errors::{ClassworkError, Result};
use crate::models::{
    PaginationInfo,
    enrollments::{
        entities::{EnrolledStudent, StudentEnrollment},
        requests::EnrollmentListQuery,
        responses::EnrollmentListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    pub async fn get_enrollment_impl(
        &self,
        course_id: i64,
        user_id: i64,
    ) -> Result<Option<StudentEnrollment>> {
        let result = StudentEnrollments::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(result.map(|m| m.into_enrollment()))
    }

    pub async fn filter_enrolled_user_ids_impl(
        &self,
        course_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<i64>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        StudentEnrollments::find()
            .select_only()
            .column(Column::UserId)
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::UserId.is_in(user_ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询选课记录失败: {e}")))
    }

    /// 批量选课，在同一事务中插入
    pub async fn create_enrollments_impl(
        &self,
        course_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<StudentEnrollment>> {
        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("开启事务失败: {e}")))?;

        let mut created = Vec::with_capacity(user_ids.len());
        for &user_id in user_ids {
            let model = ActiveModel {
                course_id: Set(course_id),
                user_id: Set(user_id),
                enrolled_at: Set(now),
                ..Default::default()
            };
            let result = model
                .insert(&txn)
                .await
                .map_err(|e| ClassworkError::database_operation(format!("选课失败: {e}")))?;
            created.push(result.into_enrollment());
        }

        txn.commit()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(created)
    }

    pub async fn delete_enrollment_impl(&self, course_id: i64, user_id: i64) -> Result<bool> {
        let result = StudentEnrollments::delete_many()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("退课失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 分页列出课程学生
    pub async fn list_enrollments_with_pagination_impl(
        &self,
        course_id: i64,
        query: EnrollmentListQuery,
    ) -> Result<EnrollmentListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = StudentEnrollments::find().filter(Column::CourseId.eq(course_id));

        // 搜索条件：先找出匹配的用户
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            let matched: Vec<i64> = Users::find()
                .select_only()
                .column(users::Column::Id)
                .filter(
                    Condition::any()
                        .add(users::Column::Username.contains(&escaped))
                        .add(users::Column::DisplayName.contains(&escaped)),
                )
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| ClassworkError::database_operation(format!("查询用户失败: {e}")))?;

            if matched.is_empty() {
                return Ok(EnrollmentListResponse {
                    items: vec![],
                    pagination: PaginationInfo::new(page, size, 0, 0),
                });
            }
            select = select.filter(Column::UserId.is_in(matched));
        }

        select = select
            .order_by_desc(Column::EnrolledAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询选课总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询选课页数失败: {e}")))?;

        let enrollments = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询选课列表失败: {e}")))?;

        let user_ids: Vec<i64> = enrollments.iter().map(|e| e.user_id).collect();
        let mut users: HashMap<i64, _> = self
            .get_users_by_ids_impl(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let items = enrollments
            .into_iter()
            .filter_map(|m| {
                let user = users.remove(&m.user_id)?;
                Some(EnrolledStudent {
                    enrollment: m.into_enrollment(),
                    user,
                })
            })
            .collect();

        Ok(EnrollmentListResponse {
            items,
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, seed_user};
    use crate::models::courses::requests::CreateCourseRequest;
    use crate::models::enrollments::requests::EnrollmentListQuery;
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_enroll_list_and_remove() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "tessa", UserRole::Teacher).await;
        let s1 = seed_user(&storage, "stud1", UserRole::Student).await;
        let s2 = seed_user(&storage, "stud2", UserRole::Student).await;
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

        let created = storage
            .create_enrollments_impl(course.id, &[s1.id, s2.id])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);

        // 重复选课违反唯一约束
        assert!(
            storage
                .create_enrollments_impl(course.id, &[s1.id])
                .await
                .is_err()
        );

        let enrolled = storage
            .filter_enrolled_user_ids_impl(course.id, &[s1.id, teacher.id])
            .await
            .unwrap();
        assert_eq!(enrolled, vec![s1.id]);

        let listed = storage
            .list_enrollments_with_pagination_impl(
                course.id,
                EnrollmentListQuery {
                    search: Some("stud2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].user.username, "stud2");

        assert!(storage.delete_enrollment_impl(course.id, s1.id).await.unwrap());
        assert!(!storage.delete_enrollment_impl(course.id, s1.id).await.unwrap());
        assert!(
            storage
                .get_enrollment_impl(course.id, s1.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
