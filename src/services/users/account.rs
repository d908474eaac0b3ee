//! 注册与管理员建号共用的账号校验

use actix_web::HttpResponse;
use std::sync::Arc;
use tracing::error;

use crate::models::{ApiResponse, ErrorCode, users::requests::CreateUserRequest};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password, validate_username};

fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

fn conflict(code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(code, message))
}

fn internal(failure: ErrorCode) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        failure,
        "Account could not be created",
    ))
}

/// 去掉首尾空白、校验格式与唯一性并哈希密码，得到可直接写入存储的请求；
/// `failure` 是内部错误时返回的错误码
pub(crate) async fn prepare_account(
    storage: &Arc<dyn Storage>,
    request: CreateUserRequest,
    failure: ErrorCode,
) -> Result<CreateUserRequest, HttpResponse> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();

    validate_username(&username).map_err(|m| bad_request(ErrorCode::UserNameInvalid, m))?;
    validate_email(&email).map_err(|m| bad_request(ErrorCode::UserEmailInvalid, m))?;
    validate_password(&request.password)
        .map_err(|m| bad_request(ErrorCode::UserPasswordInvalid, m))?;

    let taken = |e: crate::errors::ClassworkError| {
        error!("Account uniqueness check failed: {}", e);
        internal(failure)
    };
    if storage.get_user_by_username(&username).await.map_err(taken)?.is_some() {
        return Err(conflict(
            ErrorCode::UserNameAlreadyExists,
            "Username already exists",
        ));
    }
    if storage.get_user_by_email(&email).await.map_err(taken)?.is_some() {
        return Err(conflict(
            ErrorCode::UserEmailAlreadyExists,
            "Email already exists",
        ));
    }

    let password = hash_password(&request.password).map_err(|e| {
        error!("Password hashing failed: {}", e);
        internal(failure)
    })?;

    let display_name = request
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    Ok(CreateUserRequest {
        username,
        email,
        password,
        role: request.role,
        display_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, seed_user};
    use crate::utils::password::verify_password;
    use actix_web::http::StatusCode;

    fn request(username: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: UserRole::Teacher,
            display_name: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_prepare_account() {
        let storage = memory_storage().await;
        seed_user(&storage, "taken_name", UserRole::Student).await;
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let failure = ErrorCode::UserCreationFailed;

        let ok = prepare_account(
            &storage,
            request(" new_teacher ", "t@example.edu ", "Str0ngPass"),
            failure,
        )
        .await
        .unwrap();
        assert_eq!(ok.username, "new_teacher");
        assert_eq!(ok.email, "t@example.edu");
        assert_eq!(ok.role, UserRole::Teacher);
        assert_eq!(ok.display_name, None);
        assert!(verify_password("Str0ngPass", &ok.password));

        let resp = prepare_account(
            &storage,
            request("taken_name", "x@example.edu", "Str0ngPass"),
            failure,
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = prepare_account(
            &storage,
            request("other_name", "taken_name@example.com", "Str0ngPass"),
            failure,
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = prepare_account(&storage, request("ok_name", "x@example.edu", "weak"), failure)
            .await
            .unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
