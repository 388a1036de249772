//! 运行配置：监听地址、token 签名参数与身份存储路径（环境变量读取，启动时一次性加载）。

use std::{fmt, path::PathBuf};

use anyhow::bail;
use tracing::warn;

/// 默认监听地址。
const DEFAULT_ADDR: &str = "0.0.0.0:18090";
/// 默认 issuer 标签。
const DEFAULT_ISSUER: &str = "TokenApiAuthenticationGuide";
/// 默认 audience 标签。
const DEFAULT_AUDIENCE: &str = "Client consuming the API";
/// HS256 密钥最小字节数（128 bit）。
pub(crate) const MIN_SECRET_LEN: usize = 16;

/// token 签名配置；签发与校验共用同一份。
#[derive(Clone)]
pub(crate) struct TokenConfig {
    pub(crate) secret: String,
    pub(crate) issuer: String,
    pub(crate) audience: String,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

/// 密钥来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SecretSource {
    /// `TG_TOKEN_SECRET` 显式配置。
    Env,
    /// 未配置，进程内随机生成（重启后旧 token 全部失效）。
    Generated,
}

impl SecretSource {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Generated => "generated",
        }
    }
}

/// 服务整体配置。
#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub(crate) addr: String,
    pub(crate) token: TokenConfig,
    pub(crate) secret_source: SecretSource,
    pub(crate) identity_store_path: PathBuf,
}

impl AppConfig {
    /// 从进程环境变量加载。
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意 key 查询函数加载（便于测试注入）。
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let (secret, secret_source) = match non_empty("TG_TOKEN_SECRET") {
            Some(secret) => (secret, SecretSource::Env),
            None => {
                warn!("TG_TOKEN_SECRET not set; using a per-process random secret");
                (generate_secret(), SecretSource::Generated)
            }
        };
        if secret.len() < MIN_SECRET_LEN {
            bail!("TG_TOKEN_SECRET must be at least {MIN_SECRET_LEN} bytes");
        }

        let identity_store_path = match non_empty("TG_IDENTITY_STORE_PATH") {
            Some(path) => PathBuf::from(path),
            None => {
                let home = lookup("HOME").unwrap_or_else(|| ".".to_string());
                PathBuf::from(home)
                    .join(".config")
                    .join("tokengate")
                    .join("identities.json")
            }
        };

        Ok(Self {
            addr: non_empty("TG_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            token: TokenConfig {
                secret,
                issuer: non_empty("TG_TOKEN_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
                audience: non_empty("TG_TOKEN_AUDIENCE")
                    .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
            },
            secret_source,
            identity_store_path,
        })
    }
}

/// 生成进程级随机签名密钥。
fn generate_secret() -> String {
    format!(
        "tg_sk_{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}
