//! 凭证校验：必填检查 -> 按用户名查找 -> 委托存储校验密码。

use tg_shared_protocol::CredentialSubmission;
use thiserror::Error;

use crate::identity::{Identity, IdentityStore};

/// 凭证校验失败原因。
///
/// `UnknownIdentity` 与 `BadCredentials` 仅用于内部日志，对外折叠为同一结果。
#[derive(Debug, Error)]
pub(crate) enum CredentialError {
    #[error("username and password are required")]
    MalformedRequest,
    #[error("unknown identity")]
    UnknownIdentity,
    #[error("password check failed")]
    BadCredentials,
    #[error("identity store failure: {0}")]
    Store(#[source] anyhow::Error),
}

/// 校验凭证，成功返回身份。无副作用。
pub(crate) async fn verify_credentials(
    store: &dyn IdentityStore,
    submission: &CredentialSubmission,
) -> Result<Identity, CredentialError> {
    let Some((username, password)) = submission.validated() else {
        return Err(CredentialError::MalformedRequest);
    };

    let Some(identity) = store
        .find_by_username(username)
        .await
        .map_err(CredentialError::Store)?
    else {
        // 未知用户同样付出一次密码校验成本。
        store
            .check_password_for_unknown(password)
            .await
            .map_err(CredentialError::Store)?;
        return Err(CredentialError::UnknownIdentity);
    };

    let matched = store
        .check_password(&identity, password)
        .await
        .map_err(CredentialError::Store)?;
    if !matched {
        return Err(CredentialError::BadCredentials);
    }
    Ok(identity)
}
