//! HS256 bearer tokens.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// What a token says about its bearer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub name: String,
    pub lastname: String,
    /// Privileged (administrator) role.
    pub rol: bool,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.lastname).trim().to_string()
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issues a token valid for the configured lifetime.
    pub fn issue(
        &self,
        user_id: i64,
        name: &str,
        lastname: &str,
        rol: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = unix_now();
        self.sign(&Claims {
            user_id,
            name: name.to_string(),
            lastname: lastname.to_string(),
            rol,
            iat: now,
            exp: now + self.ttl.as_secs(),
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }

    /// Checks signature, algorithm and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn issued_tokens_verify() {
        let tokens = service();
        let token = tokens.issue(5, "Ana", "Pérez", true).unwrap();

        // Header, payload and signature.
        assert_eq!(token.split('.').count(), 3);

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, 5);
        assert_eq!(claims.display_name(), "Ana Pérez");
        assert!(claims.rol);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn foreign_signatures_are_rejected() {
        let other = TokenService::new("another-secret", Duration::from_secs(3600));
        let token = other.issue(1, "Eve", "X", true).unwrap();
        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = service();
        let now = unix_now();
        let token = tokens
            .sign(&Claims {
                user_id: 1,
                name: "Old".to_string(),
                lastname: "Token".to_string(),
                rol: false,
                iat: now - 7200,
                exp: now - 60,
            })
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn claims_use_camel_case() {
        let claims = Claims {
            user_id: 9,
            name: "a".to_string(),
            lastname: "b".to_string(),
            rol: false,
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], 9);
    }
}
