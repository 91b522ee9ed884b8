use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

/// JWT service for token generation and validation.
///
/// Tokens are HS256, signed with the shared `JWT_SECRET_KEY`.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expire_minutes: i64,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            expire_minutes: config.expire_minutes,
        }
    }

    /// Generate an access token for a user.
    pub fn generate_token(&self, user_id: &str) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.expire_minutes);

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))?;

        Ok(token)
    }

    /// Validate and decode an access token.
    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;

        if token_data.claims.sub.is_empty() {
            return Err(anyhow::anyhow!("Invalid token payload"));
        }

        Ok(token_data.claims)
    }

    /// Get token expiry in seconds (for client info).
    pub fn expiry_seconds(&self) -> i64 {
        self.expire_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(expire_minutes: i64) -> AuthConfig {
        AuthConfig {
            secret_key: "test-secret-key".to_string(),
            expire_minutes,
        }
    }

    #[test]
    fn token_roundtrip() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config(1440));

        let token = service.generate_token("user_123")?;
        assert!(!token.is_empty());

        let claims = service.validate_token(&token)?;
        assert_eq!(claims.sub, "user_123");
        assert!(claims.exp > claims.iat);

        Ok(())
    }

    #[test]
    fn default_expiry_is_one_day() {
        let service = JwtService::new(&test_config(1440));
        assert_eq!(service.expiry_seconds(), 86_400);
    }

    #[test]
    fn expired_token_is_rejected() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config(-10));
        let token = service.generate_token("user_123")?;
        assert!(service.validate_token(&token).is_err());
        Ok(())
    }

    #[test]
    fn foreign_signature_is_rejected() -> Result<(), anyhow::Error> {
        let issuer = JwtService::new(&AuthConfig {
            secret_key: "other-secret".to_string(),
            expire_minutes: 15,
        });
        let verifier = JwtService::new(&test_config(15));

        let token = issuer.generate_token("user_123")?;
        assert!(verifier.validate_token(&token).is_err());
        Ok(())
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = JwtService::new(&test_config(15));
        assert!(service.validate_token("not-a-jwt").is_err());
    }
}
