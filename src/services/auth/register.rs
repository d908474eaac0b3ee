use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use crate::models::{
    ApiResponse, ErrorCode,
    auth::RegisterRequest,
    users::{entities::UserRole, requests::CreateUserRequest, responses::UserResponse},
};
use crate::services::users::account::prepare_account;

use super::AuthService;

/// 自助注册，角色固定为学生
pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let account = CreateUserRequest {
        username: register_request.username,
        email: register_request.email,
        password: register_request.password,
        role: UserRole::Student,
        display_name: register_request.display_name,
    };
    let account = match prepare_account(&storage, account, ErrorCode::RegisterFailed).await {
        Ok(account) => account,
        Err(response) => return Ok(response),
    };

    match storage.create_user(account).await {
        Ok(user) => {
            info!("Student {} registered", user.username);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                UserResponse { user },
                "Registration successful",
            )))
        }
        Err(e) => {
            error!("Register failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::RegisterFailed,
                    "Register failed",
                )),
            )
        }
    }
}
