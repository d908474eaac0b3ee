use actix_cors::Cors;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, http::Method, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use classwork_system::config::{AppConfig, CorsConfig};
use classwork_system::routes;
use classwork_system::runtime::lifetime;
use classwork_system::utils::{json_error_handler, query_error_handler};

// 开发环境输出带源码位置的文本日志，其他环境输出 JSON
fn init_tracing(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.app.log_level))
        .with_writer(writer)
        .with_level(true);

    if config.is_development() {
        builder.with_file(true).with_line_number(true).init();
    } else {
        builder.with_ansi(false).json().init();
    }
    guard
}

// 配置中包含 "*" 时放开所有来源
fn build_cors(cors: &CorsConfig) -> Cors {
    let mut policy = Cors::default()
        .allowed_headers(cors.allowed_headers.iter().map(String::as_str))
        .expose_headers(["X-Judge-Key"])
        .supports_credentials()
        .max_age(cors.max_age);

    policy = policy.allowed_methods(
        cors.allowed_methods
            .iter()
            .filter_map(|m| Method::from_bytes(m.as_bytes()).ok()),
    );

    if cors.allowed_origins.iter().any(|o| o == "*") {
        policy.allow_any_origin()
    } else {
        cors.allowed_origins
            .iter()
            .fold(policy, |policy, origin| policy.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    setup_panic!();
    let started_at = chrono::Utc::now();

    AppConfig::init().map_err(|e| std::io::Error::other(format!("Configuration error: {e}")))?;
    let config = AppConfig::get();
    let _log_guard = init_tracing(config);

    warn!(
        "{} ({} v{}) starting in {} mode",
        config.app.system_name,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.app.environment
    );

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| std::io::Error::other(format!("Startup failed: {e}")))?;

    debug!(
        "Startup finished in {} ms",
        (chrono::Utc::now() - started_at).num_milliseconds()
    );
    info!("Serving with {} workers", config.server.workers);

    let storage = web::Data::new(startup.storage);
    let cache = web::Data::new(startup.cache);
    let judge = web::Data::new(startup.judge);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config.cors))
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PayloadConfig::new(config.server.limits.max_payload_size))
            .app_data(storage.clone())
            .app_data(cache.clone())
            .app_data(judge.clone())
            // 课程子资源的 scope 必须先于 /api/v1/courses 注册，前端兜底放在最后
            .configure(routes::configure_auth_routes)
            .configure(routes::configure_user_routes)
            .configure(routes::configure_enrollments_routes)
            .configure(routes::configure_materials_routes)
            .configure(routes::configure_judge_routes)
            .configure(routes::configure_courses_routes)
            .configure(routes::configure_frontend_routes)
    })
    .keep_alive(Duration::from_secs(config.server.timeouts.keep_alive))
    .client_request_timeout(Duration::from_millis(config.server.timeouts.client_request))
    .client_disconnect_timeout(Duration::from_millis(
        config.server.timeouts.client_disconnect,
    ))
    .workers(config.server.workers);

    #[cfg(unix)]
    let server = match config.unix_socket_path() {
        Some(socket_path) => {
            warn!("Listening on unix socket {}", socket_path);
            if std::path::Path::new(socket_path).exists() {
                std::fs::remove_file(socket_path)?;
            }
            server.bind_uds(socket_path)?
        }
        None => {
            warn!("Listening on http://{}", config.server_bind_address());
            server.bind(config.server_bind_address())?
        }
    };

    #[cfg(not(unix))]
    let server = {
        warn!("Listening on http://{}", config.server_bind_address());
        server.bind(config.server_bind_address())?
    };

    tokio::select! {
        res = server.run() => res?,
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Shutdown signal received, stopping");
        }
    }

    Ok(())
}
