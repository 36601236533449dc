//! HS256 bearer tokens for signed-in authors.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use typelab_core::ports::{AuthError, TokenClaims, TokenService};

const DEV_SECRET: &str = "typelab-dev-secret";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            expiration_hours: 24,
            issuer: "typelab-api".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `JWT_SECRET`, `JWT_EXPIRATION_HOURS` and `JWT_ISSUER`, warning
    /// loudly when the built-in development secret is still in use.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let config = Self {
            secret: lookup("JWT_SECRET")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.secret),
            expiration_hours: lookup("JWT_EXPIRATION_HOURS")
                .and_then(|s| s.parse().ok())
                .filter(|hours: &i64| *hours > 0)
                .unwrap_or(defaults.expiration_hours),
            issuer: lookup("JWT_ISSUER").unwrap_or(defaults.issuer),
        };

        if config.uses_dev_secret() {
            let production = lookup("RUST_ENV").is_some_and(|v| v == "production" || v == "prod");
            if production {
                tracing::error!("SECURITY: JWT_SECRET is unset in production, tokens are forgeable");
            } else {
                tracing::warn!("Using the development JWT secret; set JWT_SECRET before deploying");
            }
        }

        config
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret == DEV_SECRET
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: Uuid,
    email: String,
    iat: i64,
    exp: i64,
    iss: String,
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        let issued = Utc::now();
        let claims = AccessClaims {
            sub: user_id,
            email: email.to_string(),
            iat: issued.timestamp(),
            exp: (issued + TimeDelta::hours(self.config.expiration_hours)).timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            },
        )?;

        Ok(TokenClaims {
            user_id: data.claims.sub,
            email: data.claims.email,
            exp: data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}
