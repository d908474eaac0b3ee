//! 前端产物目录不存在时生成占位页面，保证 rust-embed 的目录始终可用。
//! 占位页与正式的 index.html 一样经过 `%SYSTEM_NAME%` 替换。

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DIST_DIR: &str = "frontend/dist";
const BUILD_HINT: &str = "cd frontend && bun install && bun run build";

const PLACEHOLDER_INDEX: &str = r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>%SYSTEM_NAME%</title>
<style>
  body { font: 15px/1.6 system-ui, sans-serif; margin: 0; background: #f6f8fa; color: #1f2328; }
  main { max-width: 640px; margin: 12vh auto; padding: 0 24px; }
  section { background: #fff; border: 1px solid #d0d7de; border-radius: 6px; padding: 16px 20px; }
  pre { background: #1f2328; color: #e6edf3; padding: 10px 14px; border-radius: 6px; overflow-x: auto; }
  li code { background: #eaeef2; padding: 1px 5px; border-radius: 4px; }
</style>
</head>
<body>
<main>
  <h1>%SYSTEM_NAME%</h1>
  <section>
    <p>课程、资料与编程题评测接口已就绪，但服务端编译时没有找到前端页面。</p>
    <p>构建前端后重新编译服务端：</p>
    <pre>{BUILD_HINT}</pre>
    <p>也可以不重新编译，把页面放进运行目录下的 <code>frontend-custom/</code>。</p>
    <ul>
      <li>登录：<code>POST /api/v1/auth/login</code></li>
      <li>课程：<code>GET /api/v1/courses</code></li>
      <li>评测结果：<code>GET /api/v1/judge/results/{handle}</code></li>
    </ul>
  </section>
</main>
</body>
</html>
"#;

fn write_placeholder(dist: &Path) -> io::Result<()> {
    fs::create_dir_all(dist.join("assets"))?;
    let index = PLACEHOLDER_INDEX.replace("{BUILD_HINT}", BUILD_HINT);
    fs::write(dist.join("index.html"), index)?;
    fs::write(dist.join("favicon.ico"), [])
}

fn main() {
    println!("cargo:rerun-if-changed={DIST_DIR}");
    println!("cargo:rerun-if-changed=build.rs");

    let Some(root) = env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from) else {
        panic!("CARGO_MANIFEST_DIR is not set by cargo");
    };
    let dist = root.join(DIST_DIR);
    if dist.join("index.html").exists() {
        return;
    }

    println!("cargo:warning={DIST_DIR} is missing, embedding a placeholder page ({BUILD_HINT})");
    if let Err(e) = write_placeholder(&dist) {
        panic!("failed to write placeholder frontend into {}: {e}", dist.display());
    }
}
