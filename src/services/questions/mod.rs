pub mod check;
pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;
use tracing::error;

use crate::config::AppConfig;
use crate::judge::JudgeEngine;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::entities::{Course, CourseAccess},
    questions::{
        entities::{Question, QuestionDetails},
        requests::{CheckAnswerRequest, CreateQuestionRequest, UpdateQuestionRequest},
    },
};
use crate::services::materials::visible_material;
use crate::storage::Storage;

pub struct QuestionService {
    storage: Option<Arc<dyn Storage>>,
}

impl QuestionService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    pub async fn list_questions(
        &self,
        request: &HttpRequest,
        material_id: i64,
    ) -> ActixResult<HttpResponse> {
        list::list_questions(self, request, material_id).await
    }

    pub async fn create_question(
        &self,
        request: &HttpRequest,
        material_id: i64,
        body: CreateQuestionRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_question(self, request, material_id, body).await
    }

    pub async fn get_question(
        &self,
        request: &HttpRequest,
        material_id: i64,
        question_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::get_question(self, request, material_id, question_id).await
    }

    pub async fn update_question(
        &self,
        request: &HttpRequest,
        material_id: i64,
        question_id: i64,
        body: UpdateQuestionRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_question(self, request, material_id, question_id, body).await
    }

    pub async fn delete_question(
        &self,
        request: &HttpRequest,
        material_id: i64,
        question_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_question(self, request, material_id, question_id).await
    }

    pub async fn check_answer(
        &self,
        request: &HttpRequest,
        material_id: i64,
        question_id: i64,
        body: CheckAnswerRequest,
    ) -> ActixResult<HttpResponse> {
        check::check_answer(self, request, material_id, question_id, body).await
    }
}

pub(crate) fn question_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::QuestionNotFound,
        "Question not found",
    ))
}

fn load_failed(e: impl std::fmt::Display, question_id: i64) -> HttpResponse {
    error!("Failed to load question {}: {}", question_id, e);
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        "Failed to load question",
    ))
}

/// 加载资料下的题目，资料须对当前身份可见
pub(crate) async fn question_in_material(
    storage: &Arc<dyn Storage>,
    course: &Course,
    access: CourseAccess,
    material_id: i64,
    question_id: i64,
) -> Result<Question, HttpResponse> {
    visible_material(storage, course, access, material_id).await?;
    match storage.get_question_by_id(question_id).await {
        Ok(Some(question)) if question.material_id == material_id => Ok(question),
        Ok(_) => Err(question_not_found()),
        Err(e) => Err(load_failed(e, question_id)),
    }
}

/// 按题目 id 加载课程下的题目，通过所属资料确认课程归属
pub(crate) async fn question_in_course(
    storage: &Arc<dyn Storage>,
    course: &Course,
    access: CourseAccess,
    question_id: i64,
) -> Result<Question, HttpResponse> {
    let question = match storage.get_question_by_id(question_id).await {
        Ok(Some(question)) => question,
        Ok(None) => return Err(question_not_found()),
        Err(e) => return Err(load_failed(e, question_id)),
    };
    // 资料不在本课程时同样视为题目不存在
    match visible_material(storage, course, access, question.material_id).await {
        Ok(_) => Ok(question),
        Err(_) => Err(question_not_found()),
    }
}

/// 学生视图去掉答案
pub(crate) fn present(question: Question, access: CourseAccess) -> Question {
    if access.can_manage() {
        question
    } else {
        question.redacted()
    }
}

/// 校验题型字段，编程语言以评测配置为准
pub(crate) fn validate_details(request: &HttpRequest, details: &QuestionDetails) -> Result<(), String> {
    match request.app_data::<web::Data<Arc<JudgeEngine>>>() {
        Some(engine) => details.validate(|lang| engine.supports(lang)),
        None => details.validate(|lang| AppConfig::get().judge_language_id(lang).is_some()),
    }
}

fn invalid_question(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::QuestionInvalid, msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        courses::requests::CreateCourseRequest, materials::requests::CreateMaterialRequest,
        users::entities::UserRole,
    };
    use crate::storage::sea_orm_storage::test_support::{memory_storage, seed_user};
    use actix_web::http::StatusCode;

    struct Fixture {
        storage: Arc<dyn Storage>,
        course: Course,
        other: Course,
        material_id: i64,
        question: Question,
    }

    async fn fixture() -> Fixture {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "teacher_a", UserRole::Teacher).await;
        let storage: Arc<dyn Storage> = Arc::new(storage);

        let mut courses = Vec::new();
        for name in ["Rust", "Go"] {
            let course = storage
                .create_course(
                    teacher.id,
                    CreateCourseRequest {
                        teacher_id: None,
                        name: name.to_string(),
                        description: None,
                    },
                )
                .await
                .unwrap();
            courses.push(course);
        }
        let other = courses.pop().unwrap();
        let course = courses.pop().unwrap();

        let material = storage
            .create_material(
                course.id,
                teacher.id,
                CreateMaterialRequest {
                    title: "Quiz".to_string(),
                    content: String::new(),
                    position: None,
                    is_published: true,
                },
            )
            .await
            .unwrap();

        let question = storage
            .create_question(
                material.id,
                CreateQuestionRequest {
                    prompt: "Pick one".to_string(),
                    position: None,
                    points: 5.0,
                    details: QuestionDetails::MultipleChoice {
                        options: vec!["a".to_string(), "b".to_string()],
                        answers: vec![1],
                        allow_multiple: false,
                    },
                },
            )
            .await
            .unwrap();

        Fixture {
            storage,
            course,
            other,
            material_id: material.id,
            question,
        }
    }

    #[tokio::test]
    async fn test_question_lookup_scoped_to_course() {
        let f = fixture().await;

        let found = question_in_course(&f.storage, &f.course, CourseAccess::Student, f.question.id)
            .await
            .unwrap();
        assert_eq!(found.id, f.question.id);

        let resp = question_in_course(&f.storage, &f.other, CourseAccess::Admin, f.question.id)
            .await
            .unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        // 题目不属于路径中的资料
        let resp = question_in_material(
            &f.storage,
            &f.course,
            CourseAccess::Instructor,
            f.material_id + 100,
            f.question.id,
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_present_redacts_for_students() {
        let f = fixture().await;

        match present(f.question.clone(), CourseAccess::Student).details {
            QuestionDetails::MultipleChoice { answers, .. } => assert!(answers.is_empty()),
            other => panic!("unexpected details {other:?}"),
        }
        match present(f.question, CourseAccess::Instructor).details {
            QuestionDetails::MultipleChoice { answers, .. } => assert_eq!(answers, vec![1]),
            other => panic!("unexpected details {other:?}"),
        }
    }
}
