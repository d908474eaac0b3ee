/*!
 * 速率限制中间件
 *
 * 固定窗口计数：窗口从某个键的第一次请求开始，窗口内超过上限返回 429，
 * 并通过 `Retry-After` 告知窗口剩余秒数。
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())
 *     .route(web::post().to(login))
 * ```
 *
 * 已认证的请求按用户计数，其余按客户端 IP。计数器在所有 worker 间共享。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue, RETRY_AFTER},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::{IpAddr, SocketAddr};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};

const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

struct Window {
    opened: Instant,
    hits: AtomicU32,
}

impl Window {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            opened: Instant::now(),
            hits: AtomicU32::new(0),
        })
    }
}

// 条目闲置十分钟后回收，长于任何预设窗口
static WINDOWS: Lazy<Cache<String, Arc<Window>>> = Lazy::new(|| {
    Cache::builder()
        .time_to_idle(Duration::from_secs(600))
        .max_capacity(100_000)
        .build()
});

enum Verdict {
    Allowed { remaining: u32 },
    Limited { retry_after: u64 },
}

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window: Duration,
    scope: &'static str,
}

impl RateLimit {
    pub fn new(scope: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            scope,
        }
    }

    /// 5 次/分钟
    pub fn login() -> Self {
        Self::new("login", 5, 60)
    }

    /// 3 次/分钟
    pub fn register() -> Self {
        Self::new("register", 3, 60)
    }

    /// 10 次/分钟
    pub fn refresh_token() -> Self {
        Self::new("refresh", 10, 60)
    }

    /// 评测提交与试运行，20 次/分钟
    pub fn judge() -> Self {
        Self::new("judge", 20, 60)
    }

    fn key(&self, client: &str) -> String {
        format!("{}:{}", self.scope, client)
    }

    async fn check(&self, key: String) -> Verdict {
        let mut window = WINDOWS.get_with(key.clone(), async { Window::new() }).await;
        if window.opened.elapsed() >= self.window {
            window = Window::new();
            WINDOWS.insert(key, window.clone()).await;
        }

        let hits = window.hits.fetch_add(1, Ordering::Relaxed) + 1;
        if hits > self.max_requests {
            let left = self.window.saturating_sub(window.opened.elapsed());
            Verdict::Limited {
                retry_after: left.as_secs().max(1),
            }
        } else {
            Verdict::Allowed {
                remaining: self.max_requests - hits,
            }
        }
    }
}

// 优先用户 ID；否则取 realip（已处理 Forwarded / X-Forwarded-For），无法解析时退回 peer 地址
fn client_key(req: &ServiceRequest) -> String {
    if let Some(user_id) = req.extensions().get::<User>().map(|u| u.id) {
        return format!("user:{user_id}");
    }

    let parse = |raw: &str| {
        raw.parse::<IpAddr>()
            .ok()
            .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
    };

    let ip = req
        .connection_info()
        .realip_remote_addr()
        .and_then(parse)
        .or_else(|| req.peer_addr().map(|addr| addr.ip()));

    match ip {
        Some(ip) => format!("ip:{ip}"),
        None => "ip:unknown".to_string(),
    }
}

fn too_many_requests(retry_after: u64, limit: u32) -> HttpResponse {
    HttpResponse::TooManyRequests()
        .insert_header((RETRY_AFTER, retry_after.to_string()))
        .insert_header((X_RATELIMIT_LIMIT, limit.to_string()))
        .insert_header((X_RATELIMIT_REMAINING, "0"))
        .json(ApiResponse::error_empty(
            ErrorCode::RateLimitExceeded,
            "请求过于频繁，请稍后再试",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let key = limit.key(&client_key(&req));

            match limit.check(key.clone()).await {
                Verdict::Limited { retry_after } => {
                    warn!("Rate limit exceeded for {} ({}/window)", key, limit.max_requests);
                    Ok(req.into_response(
                        too_many_requests(retry_after, limit.max_requests).map_into_right_body(),
                    ))
                }
                Verdict::Allowed { remaining } => {
                    let mut res = srv.call(req).await?;
                    let headers = res.headers_mut();
                    headers.insert(
                        HeaderName::from_static(X_RATELIMIT_LIMIT),
                        HeaderValue::from(limit.max_requests),
                    );
                    headers.insert(
                        HeaderName::from_static(X_RATELIMIT_REMAINING),
                        HeaderValue::from(remaining),
                    );
                    Ok(res.map_into_left_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test, web};

    #[actix_web::test]
    async fn test_presets() {
        let login = RateLimit::login();
        assert_eq!((login.max_requests, login.window.as_secs()), (5, 60));
        assert_eq!(RateLimit::register().max_requests, 3);
        assert_eq!(RateLimit::refresh_token().max_requests, 10);
        assert_eq!(RateLimit::judge().key("user:3"), "judge:user:3");
    }

    #[tokio::test]
    async fn test_window_resets_after_expiry() {
        let limit = RateLimit {
            max_requests: 1,
            window: Duration::from_millis(50),
            scope: "test-reset",
        };
        let key = limit.key("ip:10.9.9.9");

        assert!(matches!(limit.check(key.clone()).await, Verdict::Allowed { remaining: 0 }));
        assert!(matches!(limit.check(key.clone()).await, Verdict::Limited { .. }));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(matches!(limit.check(key).await, Verdict::Allowed { .. }));
    }

    #[actix_web::test]
    async fn test_requests_over_limit_rejected() {
        let app = test::init_service(
            App::new().service(
                web::resource("/limited")
                    .wrap(RateLimit::new("test-over-limit", 2, 60))
                    .route(web::post().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let call = || {
            test::TestRequest::post()
                .uri("/limited")
                .peer_addr("10.1.2.3:5000".parse().unwrap())
                .to_request()
        };

        let resp = test::call_service(&app, call()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(X_RATELIMIT_REMAINING).unwrap(), "1");

        let resp = test::call_service(&app, call()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, call()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry: u64 = resp
            .headers()
            .get(RETRY_AFTER)
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry));

        // 其他 IP 不受影响
        let req = test::TestRequest::post()
            .uri("/limited")
            .peer_addr("10.1.2.4:5000".parse().unwrap())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
