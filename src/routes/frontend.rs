//! 前端静态资源路由
//!
//! 前端构建产物通过 rust-embed 编译进二进制，`frontend-custom/` 中的同名文件优先。
//! 未知路径回退到 index.html；`/api/` 下未匹配的路径返回 JSON 404。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header, web};
use rust_embed::Embed;
use std::path::{Component, Path};

use crate::config::AppConfig;
use crate::models::{ApiResponse, ErrorCode};

#[derive(Embed)]
#[folder = "frontend/dist/"]
struct FrontendAssets;

const CUSTOM_DIR: &str = "./frontend-custom";
const INDEX: &str = "index.html";

const IMMUTABLE: &str = "public, max-age=31536000, immutable";
const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

// 扩展名 -> (MIME, 是否长期缓存)；带 hash 的构建产物可长期缓存
fn asset_kind(path: &str) -> (&'static str, bool) {
    let ext = Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match ext.as_str() {
        "html" => ("text/html; charset=utf-8", false),
        "js" | "mjs" => ("application/javascript; charset=utf-8", true),
        "css" => ("text/css; charset=utf-8", true),
        "json" | "map" => ("application/json; charset=utf-8", false),
        "txt" => ("text/plain; charset=utf-8", false),
        "png" => ("image/png", true),
        "jpg" | "jpeg" => ("image/jpeg", true),
        "gif" => ("image/gif", true),
        "svg" => ("image/svg+xml", true),
        "webp" => ("image/webp", true),
        "ico" => ("image/x-icon", false),
        "woff" => ("font/woff", true),
        "woff2" => ("font/woff2", true),
        "ttf" => ("font/ttf", true),
        "wasm" => ("application/wasm", true),
        _ => ("application/octet-stream", false),
    }
}

fn render_index(content: &[u8], system_name: &str) -> Vec<u8> {
    String::from_utf8_lossy(content)
        .replace("%BASE_PATH%", "")
        .replace("%SYSTEM_NAME%", system_name)
        .into_bytes()
}

/// 只接受普通的相对路径分段
fn is_safe_path(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

fn load_asset(path: &str) -> Option<Vec<u8>> {
    let custom = is_safe_path(path)
        .then(|| std::fs::read(Path::new(CUSTOM_DIR).join(path)).ok())
        .flatten();
    custom.or_else(|| FrontendAssets::get(path).map(|f| f.data.into_owned()))
}

fn is_api_path(path: &str) -> bool {
    path == "api" || path.starts_with("api/")
}

const NOT_BUILT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Classwork System</title></head>
<body>
    <h1>Frontend not built</h1>
    <p>Build the frontend (<code>cd frontend &amp;&amp; bun run build</code>) and rebuild the server.</p>
</body>
</html>"#;

pub async fn serve_frontend(req: HttpRequest) -> ActixResult<HttpResponse> {
    let path = req.match_info().query("tail").trim_start_matches('/');

    if is_api_path(path) {
        return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::NotFound,
            format!("No API route for /{path}"),
        )));
    }

    let asset = (!path.is_empty())
        .then(|| load_asset(path).map(|data| (path, data)))
        .flatten()
        .or_else(|| load_asset(INDEX).map(|data| (INDEX, data)));

    let Some((served, data)) = asset else {
        return Ok(HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body(NOT_BUILT_PAGE));
    };

    let (mime, cacheable) = asset_kind(served);
    let body = if served == INDEX {
        render_index(&data, &AppConfig::get().app.system_name)
    } else {
        data
    };

    Ok(HttpResponse::Ok()
        .content_type(mime)
        .insert_header((
            header::CACHE_CONTROL,
            if cacheable { IMMUTABLE } else { NO_CACHE },
        ))
        .body(body))
}

/// 兜底路由，需最后注册
pub fn configure_frontend_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{tail:.*}", web::get().to(serve_frontend));
}
