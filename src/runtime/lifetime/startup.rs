use crate::cache::{
    ObjectCache,
    register::{get_object_cache_plugin, register_builtin_plugins},
};
use crate::config::AppConfig;
use crate::judge::JudgeEngine;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

type StartupResult<T> = Result<T, Box<dyn std::error::Error>>;

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub judge: Arc<JudgeEngine>,
}

/// 按名称构造缓存后端
async fn build_cache(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)?;
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> StartupResult<Arc<dyn ObjectCache>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    if get_object_cache_plugin(cache_type).is_none() {
        warn!("Cache backend '{}' not found in registry", cache_type);
    } else if let Some(cache) = build_cache(cache_type).await {
        return Ok(cache);
    }

    if cache_type != "moka" {
        warn!("Falling back to memory cache");
        if let Some(cache) = build_cache("moka").await {
            return Ok(cache);
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

const ADMIN_USERNAME: &str = "admin";

/// 随机密码，大小写字母与数字各至少一个
fn generate_random_password(length: usize) -> String {
    use rand::{Rng, seq::SliceRandom};
    const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
    const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
    const DIGITS: &[u8] = b"23456789";
    const SYMBOLS: &[u8] = b"!@#$%";

    let mut rng = rand::rng();
    let pick = |rng: &mut rand::rngs::ThreadRng, set: &[u8]| set[rng.random_range(0..set.len())];

    let mut bytes: Vec<u8> = [UPPER, LOWER, DIGITS]
        .into_iter()
        .map(|set| pick(&mut rng, set))
        .collect();
    let all = [UPPER, LOWER, DIGITS, SYMBOLS].concat();
    while bytes.len() < length {
        bytes.push(pick(&mut rng, &all));
    }
    bytes.shuffle(&mut rng);
    bytes.into_iter().map(char::from).collect()
}

/// 空库时创建 admin 账号；未提供密码时生成一个并返回
async fn seed_admin(
    storage: &Arc<dyn Storage>,
    password: Option<String>,
) -> StartupResult<Option<String>> {
    let existing = storage.count_users().await?;
    if existing > 0 {
        debug!("{} user(s) present, admin seed skipped", existing);
        return Ok(None);
    }

    let generated = password.is_none();
    let password = password.unwrap_or_else(|| generate_random_password(16));

    let admin = storage
        .create_user(CreateUserRequest {
            username: ADMIN_USERNAME.to_string(),
            email: "admin@localhost".to_string(),
            password: hash_password(&password)?,
            role: UserRole::Admin,
            display_name: Some("Administrator".to_string()),
        })
        .await?;
    info!("Seeded admin account (id {})", admin.id);

    Ok(generated.then_some(password))
}

/// 创建评测引擎并启动过期结果清理
fn create_judge() -> StartupResult<Arc<JudgeEngine>> {
    let config = &AppConfig::get().judge;
    let engine = Arc::new(JudgeEngine::from_config(config)?);
    engine.spawn_sweeper(Duration::from_secs(config.cleanup_interval_secs.max(1)));
    warn!(
        "Judge proxy ready: {} ({} language(s), result ttl {}s)",
        config.base_url,
        config.languages.len(),
        config.cache_ttl_secs
    );
    Ok(engine)
}

/// 准备服务器启动的上下文
/// 包括存储、缓存和评测引擎
pub async fn prepare_server_startup() -> StartupResult<StartupContext> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    register_builtin_plugins();
    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    let admin_password = std::env::var("ADMIN_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty());
    match seed_admin(&storage, admin_password).await {
        Ok(Some(generated)) => {
            warn!("ADMIN_PASSWORD not set, generated password for '{ADMIN_USERNAME}': {generated}");
            warn!("Save it now or set ADMIN_PASSWORD before the first start");
        }
        Ok(None) => {}
        Err(e) => warn!("Admin seed skipped: {}", e),
    }

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    let judge = create_judge()?;

    Ok(StartupContext {
        storage,
        cache,
        judge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::test_support::memory_storage;
    use crate::utils::password::verify_password;
    use crate::utils::validate::validate_password;

    #[tokio::test]
    async fn test_seed_admin_only_on_empty_database() {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);

        let generated = seed_admin(&storage, None).await.unwrap();
        let generated = generated.expect("password should be generated");
        let admin = storage
            .get_user_by_username_or_email(ADMIN_USERNAME)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(verify_password(&generated, &admin.password_hash));

        assert_eq!(seed_admin(&storage, None).await.unwrap(), None);
        assert_eq!(storage.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_admin_uses_given_password() {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let seeded = seed_admin(&storage, Some("Given-Pass1".to_string()))
            .await
            .unwrap();
        assert_eq!(seeded, None);
    }

    #[test]
    fn test_generated_password_meets_policy() {
        for _ in 0..20 {
            let pwd = generate_random_password(16);
            assert_eq!(pwd.chars().count(), 16);
            assert!(validate_password(&pwd).is_ok(), "{pwd}");
        }
    }
}
