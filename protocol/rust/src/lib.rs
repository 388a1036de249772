// 文件职责：
// 1) 定义认证服务与客户端共用的请求/响应数据结构。
// 2) 固定对外路由与 Bearer 头解析规则，保证各端一致。
// 3) 作为 Rust 侧协议唯一代码源，供服务端与测试复用。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 签发 token 路由。
pub const TOKEN_ROUTE: &str = "/api/account/token";
/// 受保护示例路由。
pub const PROTECTED_EXAMPLE_ROUTE: &str = "/api/testauth/example";
/// 受保护示例接口的固定返回文案。
pub const AUTHORIZED_MESSAGE: &str = "You have been successfully authorized via a bearer token!";
/// Authorization 头使用的认证方案名。
pub const BEARER_SCHEME: &str = "Bearer";

/// 凭证提交（仅在单次请求内存在，不落盘）。
///
/// 字段缺失时反序列化为 `None`，由 [`CredentialSubmission::validated`] 统一判定，
/// 以便在任何身份查询之前返回"请求格式错误"。
///
/// `Debug` 输出中密码被遮蔽，可放心写入日志。
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialSubmission {
    // 用户名（兼容首字母大写的字段名）。
    #[serde(default, alias = "Username", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    // 明文密码，仅用于本次校验。
    #[serde(default, alias = "Password", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for CredentialSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSubmission")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialSubmission {
    /// 构造完整凭证。
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// 返回 `(username, password)`；任一字段缺失或为空白时返回 `None`。
    pub fn validated(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().map(str::trim)?;
        let password = self.password.as_deref()?;
        if username.is_empty() || password.trim().is_empty() {
            return None;
        }
        Some((username, password))
    }
}

/// 签发成功响应：`{ "result": "<token>" }`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub result: String,
}

/// 解析 `Authorization` 头中的 Bearer token（方案名大小写不敏感）。
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// 构造 `Authorization` 头取值。
pub fn bearer_header_value(token: &str) -> String {
    format!("{BEARER_SCHEME} {token}")
}
