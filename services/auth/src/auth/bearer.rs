//! Bearer 提取器：在受保护 handler 执行前完成 token 校验。

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tg_shared_protocol::parse_bearer;

use crate::{api::error::ApiError, auth::token::ValidatedToken, state::AppState};

/// 已通过 Bearer 校验的请求主体。
pub(crate) struct BearerIdentity(pub(crate) ValidatedToken);

impl FromRequestParts<AppState> for BearerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(AUTHORIZATION) else {
            return Err(ApiError::missing_bearer("missing Authorization header"));
        };
        let Some(token) = raw.to_str().ok().and_then(parse_bearer) else {
            return Err(ApiError::missing_bearer("Authorization header is not a bearer token"));
        };
        let validated = state.tokens.validate(token)?;
        Ok(Self(validated))
    }
}
