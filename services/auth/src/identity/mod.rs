//! 身份存储抽象：按用户名查找身份、委托存储校验密码。

pub(crate) mod memory;
pub(crate) mod password;

use async_trait::async_trait;

/// 已知身份（不含密码哈希）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub(crate) username: String,
    pub(crate) email: String,
}

/// 外部身份存储能力；哈希与加盐完全由实现方负责。
#[async_trait]
pub(crate) trait IdentityStore: Send + Sync {
    /// 按用户名查找身份。
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Identity>>;

    /// 校验身份的密码。
    async fn check_password(&self, identity: &Identity, password: &str) -> anyhow::Result<bool>;

    /// 用户名不存在时执行一次等成本的密码校验并丢弃结果，
    /// 使未知用户与密码错误的响应耗时一致。
    async fn check_password_for_unknown(&self, password: &str) -> anyhow::Result<()>;
}
