//! 鉴权模块：凭证校验、token 签发/校验与接口处理。

pub(crate) mod bearer;
pub(crate) mod handlers;
pub(crate) mod token;
pub(crate) mod token_crypto;
pub(crate) mod verifier;
