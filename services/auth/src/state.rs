//! 服务共享状态：token 签发/校验器与身份存储句柄（均为只读）。

use std::sync::Arc;

use tracing::info;

use crate::{
    auth::token::TokenAuthority,
    config::AppConfig,
    identity::{IdentityStore, memory::MemoryIdentityStore},
};

/// 服务共享状态。
#[derive(Clone)]
pub(crate) struct AppState {
    /// token 签发/校验器（共享密钥只读）。
    pub(crate) tokens: Arc<TokenAuthority>,
    /// 外部身份存储。
    pub(crate) identities: Arc<dyn IdentityStore>,
}

impl AppState {
    /// 由已构造的协作方组装状态。
    pub(crate) fn new(tokens: TokenAuthority, identities: Arc<dyn IdentityStore>) -> Self {
        Self {
            tokens: Arc::new(tokens),
            identities,
        }
    }

    /// 按配置装配：加载身份种子文件并初始化签名器。
    pub(crate) fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store = MemoryIdentityStore::load(&config.identity_store_path)?;
        info!(
            "loaded {} identities from {}",
            store.len(),
            config.identity_store_path.display()
        );
        let tokens = TokenAuthority::new(&config.token)?;
        Ok(Self::new(tokens, Arc::new(store)))
    }
}
