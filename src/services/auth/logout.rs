use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::middlewares::require_jwt::user_cache_key;
use crate::models::ApiResponse;
use crate::utils::jwt::{ACCESS_TOKEN_COOKIE, JwtUtils};

/// 清除两个会话 cookie，并丢弃该 access token 的用户缓存
pub async fn handle_logout(request: &HttpRequest) -> ActixResult<HttpResponse> {
    if let Some(cookie) = request.cookie(ACCESS_TOKEN_COOKIE)
        && let Some(cache) = request.app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
    {
        cache.remove(&user_cache_key(cookie.value())).await;
    }

    let mut response = HttpResponse::Ok();
    for cookie in JwtUtils::cleared_cookies() {
        response.cookie(cookie);
    }
    Ok(response.json(ApiResponse::<()>::success_empty("Logout successful")))
}
