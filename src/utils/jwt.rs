//! 会话令牌与 cookie
//!
//! access token 短期有效，用于每个请求；refresh token 只用于 `/auth/refresh`。
//! 两者都以 HttpOnly cookie 下发，access token 也可通过 `Authorization: Bearer` 传入。

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::header::AUTHORIZATION;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::models::users::entities::User;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户 ID
    pub role: String,
    #[serde(rename = "token_type")]
    pub kind: TokenKind,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// 登录签发的一对令牌
#[derive(Debug)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_ttl: chrono::Duration,
}

pub struct JwtUtils;

impl JwtUtils {
    pub fn access_ttl() -> chrono::Duration {
        chrono::Duration::minutes(AppConfig::get().jwt.access_token_expiry)
    }

    // remember_me 使用更长的 refresh 有效期
    pub fn refresh_ttl(remember_me: bool) -> chrono::Duration {
        let jwt = &AppConfig::get().jwt;
        chrono::Duration::days(if remember_me {
            jwt.refresh_token_remember_me_expiry
        } else {
            jwt.refresh_token_expiry
        })
    }

    pub fn issue(
        user_id: i64,
        role: &str,
        kind: TokenKind,
        ttl: chrono::Duration,
    ) -> Result<String, JwtError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            kind,
            exp: (now + ttl).timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };
        let key = EncodingKey::from_secret(AppConfig::get().jwt.secret.as_bytes());
        encode(&Header::default(), &claims, &key)
    }

    pub fn issue_session(user: &User, remember_me: bool) -> Result<Session, JwtError> {
        let role = user.role.to_string();
        let refresh_ttl = Self::refresh_ttl(remember_me);
        Ok(Session {
            access_token: Self::issue(user.id, &role, TokenKind::Access, Self::access_ttl())?,
            refresh_token: Self::issue(user.id, &role, TokenKind::Refresh, refresh_ttl)?,
            refresh_ttl,
        })
    }

    /// 校验签名、过期时间与令牌类型
    pub fn verify(token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let key = DecodingKey::from_secret(AppConfig::get().jwt.secret.as_bytes());
        let claims = decode::<Claims>(token, &key, &Validation::default())?.claims;
        if claims.kind != expected {
            return Err(ErrorKind::InvalidToken.into());
        }
        Ok(claims)
    }

    pub fn access_cookie(token: &str) -> Cookie<'static> {
        Self::session_cookie(
            ACCESS_TOKEN_COOKIE,
            token.to_string(),
            CookieDuration::minutes(AppConfig::get().jwt.access_token_expiry),
        )
    }

    pub fn refresh_cookie(token: &str, ttl: chrono::Duration) -> Cookie<'static> {
        Self::session_cookie(
            REFRESH_TOKEN_COOKIE,
            token.to_string(),
            CookieDuration::seconds(ttl.num_seconds()),
        )
    }

    /// max_age=0 的空 cookie，浏览器收到后删除会话
    pub fn cleared_cookies() -> [Cookie<'static>; 2] {
        [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
            .map(|name| Self::session_cookie(name, String::new(), CookieDuration::ZERO))
    }

    fn session_cookie(name: &'static str, value: String, max_age: CookieDuration) -> Cookie<'static> {
        Cookie::build(name, value)
            .path("/")
            .max_age(max_age)
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(AppConfig::get().is_production())
            .finish()
    }

    pub fn refresh_token_from(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }

    /// `Authorization: Bearer` 优先，其次 `access_token` cookie
    pub fn access_token_from(req: &actix_web::dev::ServiceRequest) -> Option<String> {
        let bearer = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string());

        bearer
            .or_else(|| req.cookie(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()))
            .filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_header_preferred_over_cookie() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer header-token"))
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "cookie-token"))
            .to_srv_request();
        assert_eq!(
            JwtUtils::access_token_from(&req).as_deref(),
            Some("header-token")
        );
    }

    #[test]
    fn test_cookie_fallback() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "cookie-token"))
            .to_srv_request();
        assert_eq!(
            JwtUtils::access_token_from(&req).as_deref(),
            Some("cookie-token")
        );

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic abc"))
            .to_srv_request();
        assert_eq!(JwtUtils::access_token_from(&req), None);
    }

    #[test]
    fn test_token_kind_is_enforced() {
        let refresh =
            JwtUtils::issue(42, "student", TokenKind::Refresh, chrono::Duration::days(1)).unwrap();
        assert!(JwtUtils::verify(&refresh, TokenKind::Access).is_err());

        let claims = JwtUtils::verify(&refresh, TokenKind::Refresh).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.role, "student");
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired =
            JwtUtils::issue(1, "admin", TokenKind::Access, chrono::Duration::hours(-1)).unwrap();
        assert!(JwtUtils::verify(&expired, TokenKind::Access).is_err());
    }

    #[test]
    fn test_cleared_cookies_expire_immediately() {
        for cookie in JwtUtils::cleared_cookies() {
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
        }
    }
}
