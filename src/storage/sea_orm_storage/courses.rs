//! 课程存储操作

use super::SeaOrmStorage;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::prelude::{Materials, Questions, StudentEnrollments};
use crate::entity::{materials, questions, student_enrollments};
use crate::errors::{ClassworkError, Result};
use crate::models::{
    PaginationInfo,
    courses::{
        entities::Course,
        requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        responses::CourseListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建课程
    pub async fn create_course_impl(
        &self,
        teacher_id: i64,
        req: CreateCourseRequest,
    ) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            teacher_id: Set(teacher_id),
            name: Set(req.name.trim().to_string()),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("创建课程失败: {e}")))?;

        Ok(result.into_course())
    }

    /// 通过 ID 获取课程
    pub async fn get_course_by_id_impl(&self, course_id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(course_id)
            .one(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 通过名称获取课程
    pub async fn get_course_by_name_impl(&self, name: &str) -> Result<Option<Course>> {
        let result = Courses::find()
            .filter(Column::Name.eq(name.trim()))
            .one(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 分页列出课程
    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Courses::find();

        // 教师筛选
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        // 学生筛选：只看已选课程
        if let Some(student_id) = query.student_id {
            let course_ids: Vec<i64> = StudentEnrollments::find()
                .select_only()
                .column(student_enrollments::Column::CourseId)
                .filter(student_enrollments::Column::UserId.eq(student_id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| {
                    ClassworkError::database_operation(format!("查询学生选课记录失败: {e}"))
                })?;

            if course_ids.is_empty() {
                return Ok(CourseListResponse {
                    items: vec![],
                    pagination: PaginationInfo::new(page, size, 0, 0),
                });
            }
            select = select.filter(Column::Id.is_in(course_ids));
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(Column::Name.contains(&escaped));
        }

        // 排序
        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        // 分页查询
        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询课程总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询课程页数失败: {e}")))?;

        let courses = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询课程列表失败: {e}")))?;

        Ok(CourseListResponse {
            items: courses.into_iter().map(|m| m.into_course()).collect(),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 更新课程信息
    pub async fn update_course_impl(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        let existing = self.get_course_by_id_impl(course_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(course_id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }

        if let Some(description) = update.description {
            model.description = Set((!description.is_empty()).then_some(description));
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("更新课程失败: {e}")))?;

        Ok(Some(result.into_course()))
    }

    /// 删除课程，连同选课记录、资料和题目
    pub async fn delete_course_impl(&self, course_id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("开启事务失败: {e}")))?;

        let material_ids: Vec<i64> = Materials::find()
            .select_only()
            .column(materials::Column::Id)
            .filter(materials::Column::CourseId.eq(course_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("查询课程资料失败: {e}")))?;

        if !material_ids.is_empty() {
            Questions::delete_many()
                .filter(questions::Column::MaterialId.is_in(material_ids))
                .exec(&txn)
                .await
                .map_err(|e| ClassworkError::database_operation(format!("删除题目失败: {e}")))?;
        }

        Materials::delete_many()
            .filter(materials::Column::CourseId.eq(course_id))
            .exec(&txn)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("删除课程资料失败: {e}")))?;

        StudentEnrollments::delete_many()
            .filter(student_enrollments::Column::CourseId.eq(course_id))
            .exec(&txn)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("删除选课记录失败: {e}")))?;

        let result = Courses::delete_by_id(course_id)
            .exec(&txn)
            .await
            .map_err(|e| ClassworkError::database_operation(format!("删除课程失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| ClassworkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, seed_user};
    use crate::models::courses::requests::{
        CourseListQuery, CreateCourseRequest, UpdateCourseRequest,
    };
    use crate::models::users::entities::UserRole;

    fn new_course(name: &str) -> CreateCourseRequest {
        CreateCourseRequest {
            teacher_id: None,
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_course_name_is_unique() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "tessa", UserRole::Teacher).await;

        storage
            .create_course_impl(teacher.id, new_course("Algorithms"))
            .await
            .unwrap();
        assert!(
            storage
                .create_course_impl(teacher.id, new_course("Algorithms"))
                .await
                .is_err()
        );
        assert!(
            storage
                .get_course_by_name_impl(" Algorithms ")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_list_scoped_by_teacher_and_student() {
        let storage = memory_storage().await;
        let t1 = seed_user(&storage, "teach1", UserRole::Teacher).await;
        let t2 = seed_user(&storage, "teach2", UserRole::Teacher).await;
        let student = seed_user(&storage, "stud1", UserRole::Student).await;

        let c1 = storage.create_course_impl(t1.id, new_course("C1")).await.unwrap();
        storage.create_course_impl(t2.id, new_course("C2")).await.unwrap();
        storage
            .create_enrollments_impl(c1.id, &[student.id])
            .await
            .unwrap();

        let all = storage
            .list_courses_with_pagination_impl(CourseListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);

        let own = storage
            .list_courses_with_pagination_impl(CourseListQuery {
                teacher_id: Some(t2.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(own.items.len(), 1);
        assert_eq!(own.items[0].name, "C2");

        let enrolled = storage
            .list_courses_with_pagination_impl(CourseListQuery {
                student_id: Some(student.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(enrolled.items.len(), 1);
        assert_eq!(enrolled.items[0].id, c1.id);
    }

    #[tokio::test]
    async fn test_update_course() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "tessa", UserRole::Teacher).await;
        let course = storage
            .create_course_impl(teacher.id, new_course("Old"))
            .await
            .unwrap();

        let updated = storage
            .update_course_impl(
                course.id,
                UpdateCourseRequest {
                    name: Some("New".to_string()),
                    description: Some("intro".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.description.as_deref(), Some("intro"));
        assert!(
            storage
                .update_course_impl(9999, UpdateCourseRequest::default())
                .await
                .unwrap()
                .is_none()
        );
    }
}
