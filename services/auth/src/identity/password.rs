//! argon2 密码哈希（PHC 字符串）。

use std::sync::LazyLock;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{PasswordHash, SaltString},
};
use tracing::warn;

/// 生成 PHC 格式哈希（默认参数）。
pub(crate) fn hash_password(password: &str) -> anyhow::Result<String> {
    hash_password_with(&Argon2::default(), password)
}

/// 使用指定 argon2 实例生成哈希。
pub(crate) fn hash_password_with(argon2: &Argon2<'_>, password: &str) -> anyhow::Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|err| anyhow!("generate salt failed: {err}"))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|err| anyhow!("encode salt failed: {err}"))?;
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("hash password failed: {err}"))?
        .to_string();
    Ok(phc)
}

/// 校验密码；哈希无法解析时视为不匹配。参数取自哈希本身。
pub(crate) fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// 未知用户路径使用的占位哈希（默认参数，进程内生成一次）。
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hash_password("tokengate-unknown-identity").unwrap_or_else(|err| {
        warn!("build dummy password hash failed: {err:#}");
        String::new()
    })
});

/// 对占位哈希执行一次校验并丢弃结果。
pub(crate) fn verify_against_dummy(password: &str) {
    let _ = verify_password(&DUMMY_HASH, password);
}

/// 低成本哈希，仅供测试使用。
#[cfg(test)]
pub(crate) fn hash_password_for_tests(password: &str) -> String {
    use argon2::{Algorithm, Params, Version};

    let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("argon2 params");
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    hash_password_with(&argon2, password).expect("hash password")
}
