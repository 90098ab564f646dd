// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed session tokens (HS256 JWT).
use std::time::Duration;

use folio_common::Role;
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};

use crate::config::{Secret, Settings, MIN_SECRET_LEN};
use crate::error::AppError;
use crate::storage::User;

/// Session lifetime: token expiry and cookie max-age (7 days)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Identity carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClaims {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for UserClaims {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Decoded token payload. Tokens with any other shape are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Issued at, seconds since the Unix epoch
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch
    pub exp: u64,
}

impl Claims {
    pub fn user(&self) -> UserClaims {
        UserClaims {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Issues and verifies session tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    /// Build a signer. An empty or short secret is a configuration error.
    pub fn new(secret: &Secret) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::Config("token signing secret is not set".to_string()));
        }
        if secret.expose().len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "token signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.expose().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose().as_bytes()),
            validation,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Self::new(&settings.jwt_secret)
    }

    /// Sign `user` into a token that expires [`SESSION_TTL`] from now.
    pub fn issue(&self, user: &UserClaims) -> Result<String, AppError> {
        self.issue_at(user, get_current_timestamp())
    }

    /// Sign `user` as if issued at `issued_at` (seconds since the epoch).
    pub fn issue_at(&self, user: &UserClaims, issued_at: u64) -> Result<String, AppError> {
        let claims = Claims {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: issued_at,
            exp: issued_at + SESSION_TTL.as_secs(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Check signature, algorithm, expiry and schema.
    ///
    /// Every failure collapses to `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(reason = %e, "rejected session token");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef-token-tests";

    fn signer() -> TokenSigner {
        TokenSigner::new(&Secret::new(SECRET)).unwrap()
    }

    fn alice() -> UserClaims {
        UserClaims {
            id: "user-1".to_string(),
            email: "a@b.com".to_string(),
            name: "Alice".to_string(),
            role: Role::Author,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let token = signer.issue(&alice()).unwrap();
        let claims = signer.verify(&token).unwrap();

        assert_eq!(claims.user(), alice());
        assert_eq!(claims.exp - claims.iat, SESSION_TTL.as_secs());
    }

    #[test]
    fn test_rejects_missing_or_short_secret() {
        assert!(matches!(
            TokenSigner::new(&Secret::default()),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            TokenSigner::new(&Secret::new("too-short")),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let signer = signer();
        let now = get_current_timestamp();

        let long_expired = signer
            .issue_at(&alice(), now - SESSION_TTL.as_secs() - 24 * 60 * 60)
            .unwrap();
        assert!(signer.verify(&long_expired).is_none());

        let just_expired = signer
            .issue_at(&alice(), now - SESSION_TTL.as_secs() - 2)
            .unwrap();
        assert!(signer.verify(&just_expired).is_none());

        let almost_expired = signer
            .issue_at(&alice(), now - SESSION_TTL.as_secs() + 60)
            .unwrap();
        assert!(signer.verify(&almost_expired).is_some());
    }

    #[test]
    fn test_tampered_token_never_validates() {
        let signer = signer();
        let token = signer.issue(&alice()).unwrap();

        for (i, original) in token.char_indices() {
            let replacement = if original == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());
            assert!(
                signer.verify(&tampered).is_none(),
                "token with byte {i} changed was accepted"
            );
        }
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = signer().issue(&alice()).unwrap();
        let other =
            TokenSigner::new(&Secret::new("another-secret-that-is-long-enough-1234")).unwrap();
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let signer = signer();
        assert!(signer.verify("").is_none());
        assert!(signer.verify("not-a-token").is_none());
        assert!(signer.verify("a.b.c").is_none());
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let signer = signer();
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let exp = get_current_timestamp() + 3600;

        let unknown_role = serde_json::json!({
            "id": "1", "email": "a@b.com", "name": "A", "role": "ROOT",
            "iat": exp - 3600, "exp": exp,
        });
        let token = encode(&Header::default(), &unknown_role, &key).unwrap();
        assert!(signer.verify(&token).is_none());

        let extra_field = serde_json::json!({
            "id": "1", "email": "a@b.com", "name": "A", "role": "ADMIN",
            "iat": exp - 3600, "exp": exp, "isAdmin": true,
        });
        let token = encode(&Header::default(), &extra_field, &key).unwrap();
        assert!(signer.verify(&token).is_none());

        let missing_exp = serde_json::json!({
            "id": "1", "email": "a@b.com", "name": "A", "role": "USER", "iat": exp,
        });
        let token = encode(&Header::default(), &missing_exp, &key).unwrap();
        assert!(signer.verify(&token).is_none());
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let signer = signer();
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let now = get_current_timestamp();
        let claims = Claims {
            id: "1".to_string(),
            email: "a@b.com".to_string(),
            name: "A".to_string(),
            role: Role::User,
            iat: now,
            exp: now + 3600,
        };
        let token = encode(&Header::new(Algorithm::HS512), &claims, &key).unwrap();
        assert!(signer.verify(&token).is_none());
    }
}
