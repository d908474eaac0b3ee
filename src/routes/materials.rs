use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireCourseAccess};
use crate::models::materials::requests::{CreateMaterialRequest, UpdateMaterialRequest};
use crate::models::questions::requests::{
    CheckAnswerRequest, CreateQuestionRequest, UpdateQuestionRequest,
};
use crate::services::{MaterialService, QuestionService};
use crate::utils::{SafeMaterialIdI64, SafeQuestionIdI64};

static MATERIAL_SERVICE: Lazy<MaterialService> = Lazy::new(MaterialService::new_lazy);
static QUESTION_SERVICE: Lazy<QuestionService> = Lazy::new(QuestionService::new_lazy);

// 资料
pub async fn list_materials(req: HttpRequest) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.list_materials(&req).await
}

pub async fn create_material(
    req: HttpRequest,
    body: web::Json<CreateMaterialRequest>,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.create_material(&req, body.into_inner()).await
}

pub async fn get_material(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.get_material(&req, material_id.0).await
}

pub async fn update_material(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
    body: web::Json<UpdateMaterialRequest>,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE
        .update_material(&req, material_id.0, body.into_inner())
        .await
}

pub async fn delete_material(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.delete_material(&req, material_id.0).await
}

// 题目
pub async fn list_questions(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
) -> ActixResult<HttpResponse> {
    QUESTION_SERVICE.list_questions(&req, material_id.0).await
}

pub async fn create_question(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
    body: web::Json<CreateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    QUESTION_SERVICE
        .create_question(&req, material_id.0, body.into_inner())
        .await
}

pub async fn get_question(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
    question_id: SafeQuestionIdI64,
) -> ActixResult<HttpResponse> {
    QUESTION_SERVICE
        .get_question(&req, material_id.0, question_id.0)
        .await
}

pub async fn update_question(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
    question_id: SafeQuestionIdI64,
    body: web::Json<UpdateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    QUESTION_SERVICE
        .update_question(&req, material_id.0, question_id.0, body.into_inner())
        .await
}

pub async fn delete_question(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
    question_id: SafeQuestionIdI64,
) -> ActixResult<HttpResponse> {
    QUESTION_SERVICE
        .delete_question(&req, material_id.0, question_id.0)
        .await
}

pub async fn check_answer(
    req: HttpRequest,
    material_id: SafeMaterialIdI64,
    question_id: SafeQuestionIdI64,
    body: web::Json<CheckAnswerRequest>,
) -> ActixResult<HttpResponse> {
    QUESTION_SERVICE
        .check_answer(&req, material_id.0, question_id.0, body.into_inner())
        .await
}

// 配置路由
pub fn configure_materials_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses/{course_id}/materials")
            .wrap(RequireCourseAccess::any())
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("").route(web::get().to(list_materials)).route(
                    web::post()
                        .to(create_material)
                        .wrap(RequireCourseAccess::manage()),
                ),
            )
            .service(
                web::resource("/{material_id}")
                    .route(web::get().to(get_material))
                    .route(
                        web::put()
                            .to(update_material)
                            .wrap(RequireCourseAccess::manage()),
                    )
                    .route(
                        web::delete()
                            .to(delete_material)
                            .wrap(RequireCourseAccess::manage()),
                    ),
            )
            .service(
                web::resource("/{material_id}/questions")
                    .route(web::get().to(list_questions))
                    .route(
                        web::post()
                            .to(create_question)
                            .wrap(RequireCourseAccess::manage()),
                    ),
            )
            .service(
                web::resource("/{material_id}/questions/{question_id}")
                    .route(web::get().to(get_question))
                    .route(
                        web::put()
                            .to(update_question)
                            .wrap(RequireCourseAccess::manage()),
                    )
                    .route(
                        web::delete()
                            .to(delete_question)
                            .wrap(RequireCourseAccess::manage()),
                    ),
            )
            .service(
                // 选择题自测
                web::resource("/{material_id}/questions/{question_id}/check")
                    .route(web::post().to(check_answer)),
            ),
    );
}
