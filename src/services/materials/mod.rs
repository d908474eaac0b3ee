pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::error;

use crate::models::{
    ApiResponse, ErrorCode,
    courses::entities::{Course, CourseAccess},
    materials::{
        entities::Material,
        requests::{CreateMaterialRequest, UpdateMaterialRequest},
    },
};
use crate::storage::Storage;

pub struct MaterialService {
    storage: Option<Arc<dyn Storage>>,
}

impl MaterialService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    pub async fn list_materials(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_materials(self, request).await
    }

    pub async fn create_material(
        &self,
        request: &HttpRequest,
        body: CreateMaterialRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_material(self, request, body).await
    }

    pub async fn get_material(
        &self,
        request: &HttpRequest,
        material_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::get_material(self, request, material_id).await
    }

    pub async fn update_material(
        &self,
        request: &HttpRequest,
        material_id: i64,
        body: UpdateMaterialRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_material(self, request, material_id, body).await
    }

    pub async fn delete_material(
        &self,
        request: &HttpRequest,
        material_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_material(self, request, material_id).await
    }
}

fn material_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::MaterialNotFound,
        "Material not found",
    ))
}

/// 加载课程下对当前身份可见的资料
///
/// 资料不属于该课程，或学生访问未发布的资料时按不存在处理。
pub(crate) async fn visible_material(
    storage: &Arc<dyn Storage>,
    course: &Course,
    access: CourseAccess,
    material_id: i64,
) -> Result<Material, HttpResponse> {
    match storage.get_material_by_id(material_id).await {
        Ok(Some(material))
            if material.course_id == course.id
                && (material.is_published || access.can_manage()) =>
        {
            Ok(material)
        }
        Ok(_) => Err(material_not_found()),
        Err(e) => {
            error!("Failed to load material {}: {}", material_id, e);
            Err(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Failed to load material",
                )),
            )
        }
    }
}
