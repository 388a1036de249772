//! Bearer token 签发与校验（HS256 三段式紧凑格式）。

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::{auth::token_crypto::SigningKey, config::TokenConfig, identity::Identity};

/// token 有效期（秒），固定 30 分钟。
pub(crate) const TOKEN_TTL_SEC: i64 = 30 * 60;
/// 签名算法标识。
const TOKEN_ALG: &str = "HS256";
/// token 类型标识。
const TOKEN_TYP: &str = "JWT";

/// token 头部。
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenHeader {
    pub(crate) alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) typ: Option<String>,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: TOKEN_ALG.to_string(),
            typ: Some(TOKEN_TYP.to_string()),
        }
    }
}

/// `aud` 声明：单值或数组。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn contains(&self, expected: &str) -> bool {
        match self {
            Self::One(aud) => aud == expected,
            Self::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// token 声明集合。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenClaims {
    /// 主体：身份邮箱。
    pub(crate) sub: String,
    /// 随机 token id，仅用于日志区分，不做重放校验。
    pub(crate) jti: String,
    pub(crate) iss: String,
    pub(crate) aud: Audience,
    /// 过期时间（unix 秒）。
    pub(crate) exp: i64,
}

/// token 校验失败原因。
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token issuer mismatch")]
    WrongIssuer,
    #[error("token audience mismatch")]
    WrongAudience,
    #[error("encode token failed: {0}")]
    Encode(String),
}

/// 签发结果。
#[derive(Debug)]
pub(crate) struct IssuedToken {
    pub(crate) token: String,
    pub(crate) claims: TokenClaims,
}

/// 校验通过的 token 信息。
#[derive(Debug, Clone)]
pub(crate) struct ValidatedToken {
    /// 已认证主体（邮箱）。
    pub(crate) subject: String,
    pub(crate) token_id: String,
    pub(crate) expires_at: DateTime<Utc>,
}

/// token 签发/校验器：持有共享密钥与 issuer/audience 标签。
pub(crate) struct TokenAuthority {
    key: SigningKey,
    issuer: String,
    audience: String,
}

impl TokenAuthority {
    /// 按配置构造。
    pub(crate) fn new(config: &TokenConfig) -> anyhow::Result<Self> {
        Ok(Self {
            key: SigningKey::new(config.secret.as_bytes())?,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// 为身份签发 token（当前时间）。
    pub(crate) fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// 为身份签发 token（指定签发时间）。
    pub(crate) fn issue_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let claims = TokenClaims {
            sub: identity.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            aud: Audience::One(self.audience.clone()),
            exp: (now + TimeDelta::seconds(TOKEN_TTL_SEC)).timestamp(),
        };
        let header_b64 = encode_segment(&TokenHeader::hs256())?;
        let payload_b64 = encode_segment(&claims)?;
        let signing_input = format!("{header_b64}.{payload_b64}");
        let sig_b64 = self.key.sign_b64url(signing_input.as_bytes());
        Ok(IssuedToken {
            token: format!("{signing_input}.{sig_b64}"),
            claims,
        })
    }

    /// 校验 token（当前时间）。
    pub(crate) fn validate(&self, token: &str) -> Result<ValidatedToken, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// 校验 token：结构 -> 签名 -> 声明 -> 过期 -> issuer -> audience。
    pub(crate) fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ValidatedToken, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().unwrap_or_default();
        let payload_b64 = parts.next().unwrap_or_default();
        let sig_b64 = parts.next().unwrap_or_default();
        if header_b64.is_empty()
            || payload_b64.is_empty()
            || sig_b64.is_empty()
            || parts.next().is_some()
        {
            return Err(TokenError::Malformed);
        }

        let header: TokenHeader = decode_segment(header_b64)?;
        let typ_ok = header
            .typ
            .as_deref()
            .is_none_or(|typ| typ.eq_ignore_ascii_case(TOKEN_TYP));
        if header.alg != TOKEN_ALG || !typ_ok {
            return Err(TokenError::Malformed);
        }
        let sig = URL_SAFE_NO_PAD
            .decode(sig_b64.as_bytes())
            .map_err(|_| TokenError::Malformed)?;

        // 签名覆盖原始 header.payload 文本，须先于 payload 解码。
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        if !self.key.verify(signing_input.as_bytes(), &sig) {
            return Err(TokenError::BadSignature);
        }

        let claims: TokenClaims = decode_segment(payload_b64)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        if claims.iss != self.issuer {
            return Err(TokenError::WrongIssuer);
        }
        if !claims.aud.contains(&self.audience) {
            return Err(TokenError::WrongAudience);
        }

        Ok(ValidatedToken {
            subject: claims.sub,
            token_id: claims.jti,
            expires_at,
        })
    }
}

/// JSON 编码并转 base64url。
fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let raw = serde_json::to_vec(value).map_err(|err| TokenError::Encode(err.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(raw))
}

/// base64url 解码并解析 JSON。
fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let raw = URL_SAFE_NO_PAD
        .decode(segment.as_bytes())
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use chrono::{DateTime, TimeDelta, Utc};
    use serde_json::json;

    use super::{TOKEN_TTL_SEC, TokenAuthority, TokenError};
    use crate::{config::TokenConfig, identity::Identity};

    fn config(secret: &str, issuer: &str, audience: &str) -> TokenConfig {
        TokenConfig {
            secret: secret.to_string(),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
        }
    }

    fn authority() -> TokenAuthority {
        TokenAuthority::new(&config("unit_test_secret_0123456789", "issuer-a", "aud-a"))
            .expect("authority")
    }

    fn alice() -> Identity {
        Identity {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
    }

    fn segment(value: serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&value).expect("json"))
    }

    #[test]
    fn issued_token_round_trips_to_subject() {
        let auth = authority();
        let issued = auth.issue(&alice()).expect("issue");
        let validated = auth.validate(&issued.token).expect("validate");

        assert_eq!(validated.subject, "alice@example.com");
        assert_eq!(validated.token_id, issued.claims.jti);
        assert_eq!(validated.expires_at.timestamp(), issued.claims.exp);
    }

    #[test]
    fn token_has_hs256_header_and_expected_claims() {
        let issued = authority().issue_at(&alice(), t0()).expect("issue");
        let parts: Vec<&str> = issued.token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).expect("header"))
                .expect("json");
        assert_eq!(header, json!({"alg": "HS256", "typ": "JWT"}));

        let payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).expect("payload"))
                .expect("json");
        assert_eq!(payload["sub"], "alice@example.com");
        assert_eq!(payload["iss"], "issuer-a");
        assert_eq!(payload["aud"], "aud-a");
        assert_eq!(payload["exp"], t0().timestamp() + TOKEN_TTL_SEC);
        assert!(!payload["jti"].as_str().unwrap_or_default().is_empty());
    }

    #[test]
    fn each_token_gets_a_fresh_id() {
        let auth = authority();
        let a = auth.issue(&alice()).expect("issue");
        let b = auth.issue(&alice()).expect("issue");
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn token_expires_after_thirty_minutes() {
        let auth = authority();
        let issued = auth.issue_at(&alice(), t0()).expect("issue");

        let just_before = t0() + TimeDelta::seconds(TOKEN_TTL_SEC - 1);
        assert!(auth.validate_at(&issued.token, just_before).is_ok());

        let at_expiry = t0() + TimeDelta::minutes(30);
        assert_eq!(
            auth.validate_at(&issued.token, at_expiry).unwrap_err(),
            TokenError::Expired
        );
        let much_later = t0() + TimeDelta::hours(5);
        assert_eq!(
            auth.validate_at(&issued.token, much_later).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn any_payload_bit_flip_breaks_the_signature() {
        let auth = authority();
        let issued = auth.issue_at(&alice(), t0()).expect("issue");
        let parts: Vec<&str> = issued.token.split('.').collect();
        let payload = URL_SAFE_NO_PAD.decode(parts[1]).expect("payload");

        for byte_idx in 0..payload.len() {
            for bit in 0..8 {
                let mut mutated = payload.clone();
                mutated[byte_idx] ^= 1 << bit;
                let token = format!(
                    "{}.{}.{}",
                    parts[0],
                    URL_SAFE_NO_PAD.encode(&mutated),
                    parts[2]
                );
                assert_eq!(
                    auth.validate_at(&token, t0()).unwrap_err(),
                    TokenError::BadSignature,
                    "byte {byte_idx} bit {bit}"
                );
            }
        }
    }

    #[test]
    fn forged_claims_with_valid_structure_are_rejected() {
        let auth = authority();
        let issued = auth.issue_at(&alice(), t0()).expect("issue");
        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged_payload = segment(json!({
            "sub": "mallory@example.com",
            "jti": "x",
            "iss": "issuer-a",
            "aud": "aud-a",
            "exp": t0().timestamp() + 999_999,
        }));
        let token = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_eq!(
            auth.validate_at(&token, t0()).unwrap_err(),
            TokenError::BadSignature
        );
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = TokenAuthority::new(&config("another_secret_0123456789", "issuer-a", "aud-a"))
            .expect("authority");
        let issued = other.issue_at(&alice(), t0()).expect("issue");
        assert_eq!(
            authority().validate_at(&issued.token, t0()).unwrap_err(),
            TokenError::BadSignature
        );
    }

    #[test]
    fn issuer_and_audience_must_match() {
        let secret = "unit_test_secret_0123456789";
        let wrong_iss = TokenAuthority::new(&config(secret, "issuer-b", "aud-a")).expect("auth");
        let wrong_aud = TokenAuthority::new(&config(secret, "issuer-a", "aud-b")).expect("auth");
        let auth = authority();

        let token = wrong_iss.issue_at(&alice(), t0()).expect("issue").token;
        assert_eq!(
            auth.validate_at(&token, t0()).unwrap_err(),
            TokenError::WrongIssuer
        );
        let token = wrong_aud.issue_at(&alice(), t0()).expect("issue").token;
        assert_eq!(
            auth.validate_at(&token, t0()).unwrap_err(),
            TokenError::WrongAudience
        );
    }

    #[test]
    fn expiry_is_checked_before_issuer() {
        let secret = "unit_test_secret_0123456789";
        let wrong_iss = TokenAuthority::new(&config(secret, "issuer-b", "aud-a")).expect("auth");
        let token = wrong_iss.issue_at(&alice(), t0()).expect("issue").token;
        let later = t0() + TimeDelta::hours(1);
        assert_eq!(
            authority().validate_at(&token, later).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn audience_array_is_accepted_when_it_contains_expected_value() {
        let secret = "unit_test_secret_0123456789";
        let key = super::SigningKey::new(secret.as_bytes()).expect("key");
        let header = segment(json!({"alg": "HS256", "typ": "JWT"}));
        let payload = segment(json!({
            "sub": "alice@example.com",
            "jti": "abc",
            "iss": "issuer-a",
            "aud": ["other", "aud-a"],
            "exp": t0().timestamp() + 60,
        }));
        let signing_input = format!("{header}.{payload}");
        let token = format!("{signing_input}.{}", key.sign_b64url(signing_input.as_bytes()));

        let validated = authority().validate_at(&token, t0()).expect("validate");
        assert_eq!(validated.subject, "alice@example.com");
    }

    #[test]
    fn malformed_tokens_are_rejected_before_signature_check() {
        let auth = authority();
        let issued = auth.issue_at(&alice(), t0()).expect("issue");
        let parts: Vec<&str> = issued.token.split('.').collect();

        let cases = [
            String::new(),
            "not-a-token".to_string(),
            format!("{}.{}", parts[0], parts[1]),
            format!("{}.{}.", parts[0], parts[1]),
            format!("{}.{}.{}.extra", parts[0], parts[1], parts[2]),
            format!("!!!.{}.{}", parts[1], parts[2]),
            format!("{}.{}.%%%", parts[0], parts[1]),
        ];
        for token in cases {
            assert_eq!(
                auth.validate_at(&token, t0()).unwrap_err(),
                TokenError::Malformed,
                "token {token:?}"
            );
        }
    }

    #[test]
    fn unsigned_algorithms_are_rejected() {
        let auth = authority();
        let issued = auth.issue_at(&alice(), t0()).expect("issue");
        let parts: Vec<&str> = issued.token.split('.').collect();
        let none_header = segment(json!({"alg": "none", "typ": "JWT"}));
        let token = format!("{none_header}.{}.{}", parts[1], parts[2]);
        assert_eq!(
            auth.validate_at(&token, t0()).unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn signed_garbage_payload_is_malformed() {
        let secret = "unit_test_secret_0123456789";
        let key = super::SigningKey::new(secret.as_bytes()).expect("key");
        let header = segment(json!({"alg": "HS256"}));
        let payload = segment(json!({"sub": "alice@example.com"}));
        let signing_input = format!("{header}.{payload}");
        let token = format!("{signing_input}.{}", key.sign_b64url(signing_input.as_bytes()));
        assert_eq!(
            authority().validate_at(&token, t0()).unwrap_err(),
            TokenError::Malformed
        );
    }
}
