use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use crate::middlewares::require_jwt::RequireJWT;
use crate::models::auth::responses::{
    RefreshTokenResponse, TokenVerificationResponse, UserInfoResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::jwt::{JwtUtils, TokenKind};

use super::AuthService;

// 401 并清除会话 cookie
fn session_expired(message: &str) -> HttpResponse {
    let mut response = HttpResponse::Unauthorized();
    for cookie in JwtUtils::cleared_cookies() {
        response.cookie(cookie);
    }
    response.json(ApiResponse::error_empty(ErrorCode::Unauthorized, message))
}

/// 用 refresh cookie 换新的 access token；角色按用户当前状态签发
pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(refresh_token) = JwtUtils::refresh_token_from(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let user_id = match JwtUtils::verify(&refresh_token, TokenKind::Refresh) {
        Ok(claims) => claims.user_id(),
        Err(e) => {
            info!("Refresh token rejected: {}", e);
            None
        }
    };
    let Some(user_id) = user_id else {
        return Ok(session_expired(
            "Login expired or invalid, please login again",
        ));
    };

    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.is_active() => user,
        Ok(_) => {
            info!("Refresh refused for missing or inactive user {}", user_id);
            return Ok(session_expired("Account is not available"));
        }
        Err(e) => {
            error!("Failed to load user {} for refresh: {}", user_id, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Token refresh failed",
                )),
            );
        }
    };

    let ttl = JwtUtils::access_ttl();
    match JwtUtils::issue(user.id, &user.role.to_string(), TokenKind::Access, ttl) {
        Ok(access_token) => Ok(HttpResponse::Ok()
            .cookie(JwtUtils::access_cookie(&access_token))
            .json(ApiResponse::success(
                RefreshTokenResponse {
                    access_token,
                    expires_in: ttl.num_seconds(),
                },
                "Token refreshed successfully",
            ))),
        Err(e) => {
            error!("Failed to issue access token for {}: {}", user.id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Token refresh failed",
                )),
            )
        }
    }
}

pub async fn handle_verify_token(_request: &HttpRequest) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        TokenVerificationResponse { is_valid: true },
        "Token is valid",
    )))
}

pub async fn handle_get_user(request: &HttpRequest) -> ActixResult<HttpResponse> {
    Ok(match RequireJWT::extract_user_claims(request) {
        Some(user) => HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user },
            "User information retrieved successfully",
        )),
        None => HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )),
    })
}
