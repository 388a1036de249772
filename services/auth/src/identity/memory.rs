//! 内存身份存储：启动时从 JSON 种子文件加载，运行期只读。

use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{
    Identity, IdentityStore,
    password::{verify_against_dummy, verify_password},
};

/// 存储内的身份记录（含 PHC 哈希）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredIdentity {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
}

/// 种子文件结构：`{"identities": [...]}`。
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct IdentitySeedFile {
    #[serde(default)]
    pub(crate) identities: Vec<StoredIdentity>,
}

/// 以规范化用户名为键的只读身份表。
#[derive(Debug, Default)]
pub(crate) struct MemoryIdentityStore {
    users: HashMap<String, StoredIdentity>,
}

impl MemoryIdentityStore {
    /// 由记录列表构造；重复用户名以后出现者为准。
    pub(crate) fn from_identities(identities: impl IntoIterator<Item = StoredIdentity>) -> Self {
        let mut users = HashMap::new();
        for identity in identities {
            let key = normalize_username(&identity.username);
            if key.is_empty() {
                warn!("skip identity with empty username");
                continue;
            }
            if users.insert(key, identity).is_some() {
                warn!("duplicate username in identity seed; keeping the last entry");
            }
        }
        Self { users }
    }

    /// 加载种子文件；文件不存在时返回空存储。
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!(
                "identity store {} not found; starting with no identities",
                path.display()
            );
            return Ok(Self::default());
        }
        let raw = fs::read(path)
            .with_context(|| format!("read identity store: {}", path.display()))?;
        let seed: IdentitySeedFile = serde_json::from_slice(&raw)
            .with_context(|| format!("decode identity store: {}", path.display()))?;
        Ok(Self::from_identities(seed.identities))
    }

    /// 身份数量。
    pub(crate) fn len(&self) -> usize {
        self.users.len()
    }
}

/// 用户名规范化：去空白并转小写。
fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Identity>> {
        Ok(self
            .users
            .get(&normalize_username(username))
            .map(|stored| Identity {
                username: stored.username.clone(),
                email: stored.email.clone(),
            }))
    }

    async fn check_password(&self, identity: &Identity, password: &str) -> anyhow::Result<bool> {
        let Some(stored) = self.users.get(&normalize_username(&identity.username)) else {
            return Ok(false);
        };
        let hash = stored.password_hash.clone();
        let password = password.to_string();
        // argon2 为 CPU 密集计算，移出 async 线程。
        let matched = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .context("password verification task failed")?;
        Ok(matched)
    }

    async fn check_password_for_unknown(&self, password: &str) -> anyhow::Result<()> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || verify_against_dummy(&password))
            .await
            .context("password verification task failed")
    }
}
