//! Signed, time-bound session tokens.
//!
//! A token is `base64url(claims).base64url(tag)` where the tag is an
//! HMAC-SHA-256 over the serialized claims.  Tokens are verified locally
//! only; there is no revocation list and logout is purely local state.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::constants::TOKEN_TTL_SECS;
use crate::error::SessionError;
use crate::types::TravelerId;
use crate::vault::SymmetricKey;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Traveler id the token is bound to.
    sub: String,
    /// Issued-at, unix seconds.
    iat: i64,
    /// Expiry, unix seconds.
    exp: i64,
}

/// Issues and verifies session tokens under a device-derived signing key.
pub struct SessionManager {
    key: SymmetricKey,
}

impl SessionManager {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    /// Produce a signed token bound to `traveler_id`, valid for 24 hours.
    pub fn issue(&self, traveler_id: &TravelerId) -> String {
        self.issue_at(traveler_id, Utc::now())
    }

    fn issue_at(&self, traveler_id: &TravelerId, issued_at: DateTime<Utc>) -> String {
        let claims = Claims {
            sub: traveler_id.as_str().to_string(),
            iat: issued_at.timestamp(),
            exp: issued_at.timestamp() + TOKEN_TTL_SECS,
        };
        // Claims is a closed struct; serialization cannot fail.
        let payload = serde_json::to_vec(&claims).expect("claims serialization");
        let encoded = URL_SAFE_NO_PAD.encode(&payload);
        let tag = self.sign(encoded.as_bytes());
        format!("{}.{}", encoded, URL_SAFE_NO_PAD.encode(tag))
    }

    /// Extract the bound identity.  Fails on a bad signature or a
    /// malformed payload; expiry is not checked here.
    pub fn subject(&self, token: &str) -> Result<TravelerId, SessionError> {
        let claims = self.verify(token)?;
        Ok(TravelerId::new(claims.sub))
    }

    /// Signature check only.
    pub fn is_valid(&self, token: &str) -> bool {
        self.verify(token).is_ok()
    }

    /// True once the validity window has elapsed.  An unparsable or
    /// unverifiable token counts as expired, never as live.
    pub fn is_expired(&self, token: &str) -> bool {
        match self.verify(token) {
            Ok(claims) => claims.exp <= Utc::now().timestamp(),
            Err(_) => true,
        }
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    fn verify(&self, token: &str) -> Result<Claims, SessionError> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(SessionError::Malformed)?;

        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| SessionError::Malformed)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| SessionError::InvalidSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| SessionError::Malformed)?;
        serde_json::from_slice(&payload).map_err(|_| SessionError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::vault::generate_symmetric_key;

    fn manager() -> SessionManager {
        SessionManager::new(generate_symmetric_key())
    }

    #[test]
    fn issue_and_extract_subject() {
        let sessions = manager();
        let token = sessions.issue(&TravelerId::new("user001"));

        assert!(sessions.is_valid(&token));
        assert!(!sessions.is_expired(&token));
        assert_eq!(sessions.subject(&token).unwrap(), TravelerId::new("user001"));
    }

    #[test]
    fn tampered_payload_rejected() {
        let sessions = manager();
        let token = sessions.issue(&TravelerId::new("user001"));

        let (_, tag) = token.split_once('.').unwrap();
        let forged_claims =
            URL_SAFE_NO_PAD.encode(br#"{"sub":"intruder","iat":0,"exp":9999999999}"#);
        let forged = format!("{forged_claims}.{tag}");

        assert!(matches!(
            sessions.subject(&forged),
            Err(SessionError::InvalidSignature)
        ));
        assert!(!sessions.is_valid(&forged));
        // fail-closed
        assert!(sessions.is_expired(&forged));
    }

    #[test]
    fn foreign_key_rejected() {
        let token = manager().issue(&TravelerId::new("user001"));
        assert!(!manager().is_valid(&token));
    }

    #[test]
    fn malformed_tokens_fail_closed() {
        let sessions = manager();
        for garbage in ["", "no-dot", "a.b.c", "!!!.###"] {
            assert!(!sessions.is_valid(garbage));
            assert!(sessions.is_expired(garbage));
            assert!(sessions.subject(garbage).is_err());
        }
    }

    #[test]
    fn expiry_window_elapses() {
        let sessions = manager();
        let stale = sessions.issue_at(
            &TravelerId::new("user001"),
            Utc::now() - Duration::seconds(TOKEN_TTL_SECS + 1),
        );

        // Signature is still sound, but the window is gone.
        assert!(sessions.is_valid(&stale));
        assert!(sessions.is_expired(&stale));
    }
}
