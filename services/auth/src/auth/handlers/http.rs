//! 鉴权 HTTP 路由处理函数。

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tg_shared_protocol::{AUTHORIZED_MESSAGE, CredentialSubmission, TokenResponse};
use tracing::debug;

use crate::{api::error::ApiError, auth::bearer::BearerIdentity, state::AppState};

/// 签发接口：校验用户名/密码并返回 token。
pub(crate) async fn token_handler(
    State(state): State<AppState>,
    payload: Result<Json<CredentialSubmission>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(submission) = payload.map_err(reject_body)?;
    state.issue_token(&submission).await.map(Json)
}

/// 受保护示例接口。
pub(crate) async fn example_handler(BearerIdentity(token): BearerIdentity) -> Json<&'static str> {
    debug!(
        subject = %token.subject,
        jti = %token.token_id,
        expires_at = %token.expires_at,
        "bearer token accepted"
    );
    Json(AUTHORIZED_MESSAGE)
}

/// 请求体无法绑定：非 JSON 声明返回 415，其余一律 400。
fn reject_body(rejection: JsonRejection) -> ApiError {
    let status = if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    } else {
        StatusCode::BAD_REQUEST
    };
    ApiError::new(status, "MALFORMED_REQUEST", rejection.body_text())
}
