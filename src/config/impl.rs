use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

// 常用部署变量 -> 配置键，优先级高于 CLASSWORK_* 前缀变量
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("APP_ENV", "app.environment"),
    ("RUST_LOG", "app.log_level"),
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("UNIX_SOCKET", "server.unix_socket_path"),
    ("CPU_COUNT", "server.workers"),
    ("JWT_SECRET", "jwt.secret"),
    ("DATABASE_URL", "database.url"),
    ("REDIS_URL", "cache.redis.url"),
    ("REDIS_KEY_PREFIX", "cache.redis.key_prefix"),
    ("CACHE_TTL", "cache.default_ttl"),
    ("JUDGE_URL", "judge.base_url"),
    ("JUDGE_API_KEY", "judge.api_key"),
];

fn environment_name() -> String {
    std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string())
}

fn with_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in ENV_OVERRIDES {
        builder = builder.set_override_option(*key, std::env::var(var).ok())?;
    }
    Ok(builder)
}

impl AppConfig {
    /// 依次合并 config.toml、config.{APP_ENV}.toml、CLASSWORK_* 与常用部署变量
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name(&format!("config.{}", environment_name())).required(false))
            .add_source(
                Environment::with_prefix("CLASSWORK")
                    .separator("_")
                    .try_parsing(true),
            );

        let mut app_config: AppConfig = with_env_overrides(builder)?.build()?.try_deserialize()?;

        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers.max(1));
        }

        app_config.validate()?;
        Ok(app_config)
    }

    // 拒绝无法正常运行的组合
    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Message(msg.to_string()));

        if self.jwt.secret.is_empty() {
            return invalid("jwt.secret must not be empty");
        }
        if self.is_production() && self.jwt.secret == DEFAULT_JWT_SECRET {
            return invalid("jwt.secret must be changed in production");
        }
        if self.judge.base_url.trim().is_empty() {
            return invalid("judge.base_url must not be empty");
        }
        if self.judge.poll_interval_ms == 0 || self.judge.max_polls == 0 {
            return invalid("judge.poll_interval_ms and judge.max_polls must be positive");
        }
        if self.judge.languages.is_empty() {
            return invalid("judge.languages must list at least one language");
        }
        Ok(())
    }

    /// 全局配置；未初始化时按需加载，失败直接退出
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 启动时调用一次
    pub fn init() -> Result<(), ConfigError> {
        APP_CONFIG
            .set(Self::load()?)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 将语言名映射为评测机语言 ID，忽略大小写
    pub fn judge_language_id(&self, language: &str) -> Option<i64> {
        self.judge
            .languages
            .get(&language.to_ascii_lowercase())
            .copied()
    }

    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        Some(self.server.unix_socket_path.as_str()).filter(|path| !path.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn bundled() -> AppConfig {
        Config::builder()
            .add_source(File::from_str(
                include_str!("../../config.toml"),
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let config = bundled();
        assert!(config.validate().is_ok());
        assert!(config.is_development());
        assert_eq!(config.server_bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_validate_rejects_default_secret_in_production() {
        let mut config = bundled();
        config.app.environment = "production".to_string();
        assert!(config.validate().is_err());

        config.jwt.secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_judge_section() {
        let mut config = bundled();
        config.judge.max_polls = 0;
        assert!(config.validate().is_err());

        let mut config = bundled();
        config.judge.languages.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_judge_language_id_ignores_case() {
        let config = bundled();
        assert_eq!(config.judge_language_id("Python"), Some(71));
        assert_eq!(config.judge_language_id("cobol"), None);
    }
}
