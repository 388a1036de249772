//! API 错误定义与响应转换。
//!
//! 对外只返回状态码（空 body），错误码与细节仅写入日志。

use axum::{
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::auth::{token::TokenError, verifier::CredentialError};

/// 未携带凭证时的质询头。
const BEARER_CHALLENGE: &str = "Bearer";
/// 携带了无效 token 时的质询头。
const INVALID_TOKEN_CHALLENGE: &str = "Bearer error=\"invalid_token\"";

/// 认证与接口错误。
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) code: &'static str,
    pub(crate) message: String,
    pub(crate) challenge: Option<&'static str>,
}

impl ApiError {
    /// 构造统一 API 错误。
    pub(crate) fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            challenge: None,
        }
    }

    /// 附加 `WWW-Authenticate` 质询。
    pub(crate) fn with_challenge(mut self, challenge: &'static str) -> Self {
        self.challenge = Some(challenge);
        self
    }

    /// 缺少或无法识别 Bearer 凭证。
    pub(crate) fn missing_bearer(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "MISSING_CREDENTIALS", message)
            .with_challenge(BEARER_CHALLENGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, status = %self.status, "{}", self.message);
        } else {
            warn!(code = self.code, status = %self.status, "{}", self.message);
        }
        let mut response = self.status.into_response();
        if let Some(challenge) = self.challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        response
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::MalformedRequest => {
                Self::new(StatusCode::BAD_REQUEST, "MALFORMED_REQUEST", err.to_string())
            }
            CredentialError::UnknownIdentity | CredentialError::BadCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", err.to_string())
            }
            CredentialError::Store(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                format!("{err:#}"),
            ),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        let code = match err {
            TokenError::Malformed => "ACCESS_TOKEN_INVALID",
            TokenError::BadSignature => "ACCESS_TOKEN_SIGNATURE_INVALID",
            TokenError::Expired => "ACCESS_TOKEN_EXPIRED",
            TokenError::WrongIssuer => "ACCESS_TOKEN_ISSUER_MISMATCH",
            TokenError::WrongAudience => "ACCESS_TOKEN_AUDIENCE_MISMATCH",
            TokenError::Encode(_) => {
                return Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    err.to_string(),
                );
            }
        };
        Self::new(StatusCode::UNAUTHORIZED, code, err.to_string())
            .with_challenge(INVALID_TOKEN_CHALLENGE)
    }
}
