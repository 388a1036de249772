//! 签发流程：凭证校验通过后为身份铸造 token。

use tg_shared_protocol::{CredentialSubmission, TokenResponse};
use tracing::info;

use crate::{api::error::ApiError, auth::verifier::verify_credentials, state::AppState};

impl AppState {
    /// 校验凭证并签发 token。
    pub(crate) async fn issue_token(
        &self,
        submission: &CredentialSubmission,
    ) -> Result<TokenResponse, ApiError> {
        let identity = verify_credentials(self.identities.as_ref(), submission).await?;
        let issued = self.tokens.issue(&identity)?;
        info!(
            username = %identity.username,
            jti = %issued.claims.jti,
            exp = issued.claims.exp,
            "bearer token issued"
        );
        Ok(TokenResponse {
            result: issued.token,
        })
    }
}
