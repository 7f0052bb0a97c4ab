//! Stateless session tokens: HS256 JWTs whose subject is an account id.
//!
//! Nothing is stored server-side, so a token stays valid until it expires.

use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, default_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            default_ttl,
        }
    }

    pub fn issue(&self, account_id: &str) -> AppResult<String> {
        self.issue_with_ttl(account_id, self.default_ttl)
    }

    pub fn issue_with_ttl(&self, account_id: &str, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    /// Returns the account id the token was issued for.
    pub fn verify(&self, token: &str) -> AppResult<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            log::debug!("Rejected session token: {}", e);
            AppError::Unauthenticated("Could not validate credentials.".to_string())
        })?;

        let subject = data.claims.sub;
        if Uuid::parse_str(&subject).is_err() {
            return Err(AppError::Unauthenticated(
                "Could not validate credentials.".to_string(),
            ));
        }
        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-test-secret-that-is-long-enough-0123";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::minutes(30))
    }

    #[test]
    fn issued_tokens_verify_to_their_account() {
        let account_id = Uuid::new_v4().to_string();
        let tokens = service();
        let token = tokens.issue(&account_id).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), account_id);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let account_id = Uuid::new_v4().to_string();
        let tokens = service();
        let token = tokens.issue_with_ttl(&account_id, Duration::seconds(-5)).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let account_id = Uuid::new_v4().to_string();
        let foreign = TokenService::new("some-other-secret-that-is-long-enough", Duration::minutes(5));
        let token = foreign.issue(&account_id).unwrap();
        assert!(matches!(service().verify(&token), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn malformed_subject_is_rejected() {
        let tokens = service();
        let token = tokens.issue("not-a-uuid").unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(service().verify("abc.def.ghi"), Err(AppError::Unauthenticated(_))));
    }
}
