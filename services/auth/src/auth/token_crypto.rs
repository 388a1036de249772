//! HMAC-SHA256 签名辅助函数。

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// 预置密钥的 HMAC-SHA256 签名器（进程内只读）。
#[derive(Clone)]
pub(crate) struct SigningKey {
    mac: HmacSha256,
}

impl SigningKey {
    /// 由共享密钥构造签名器。
    pub(crate) fn new(secret: &[u8]) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|err| anyhow::anyhow!("invalid token signing key: {err}"))?;
        Ok(Self { mac })
    }

    /// HMAC-SHA256 并输出 base64url。
    pub(crate) fn sign_b64url(&self, payload: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload);
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// 常量时间比较签名。
    pub(crate) fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.verify_slice(signature).is_ok()
    }
}

/// sha256 hex。
pub(crate) fn sha256_hex(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

/// 密钥指纹（sha256 前 12 位），用于诊断输出，不暴露密钥本身。
pub(crate) fn secret_fingerprint(secret: &str) -> String {
    sha256_hex(secret).chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    use super::{SigningKey, secret_fingerprint, sha256_hex};

    #[test]
    fn signature_verifies_only_with_same_key_and_payload() {
        let key = SigningKey::new(b"0123456789abcdef").expect("key");
        let other = SigningKey::new(b"fedcba9876543210").expect("key");
        let sig_b64 = key.sign_b64url(b"header.payload");
        let sig = URL_SAFE_NO_PAD.decode(sig_b64).expect("base64url");

        assert_eq!(sig.len(), 32);
        assert!(key.verify(b"header.payload", &sig));
        assert!(!key.verify(b"header.payload2", &sig));
        assert!(!other.verify(b"header.payload", &sig));
        assert!(!key.verify(b"header.payload", &sig[..31]));
    }

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(secret_fingerprint("abc"), "ba7816bf8f01");
    }
}
