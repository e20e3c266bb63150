// Identity provider session verification
// Tokens are issued by the identity provider; this service only verifies them

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_config::IdentityConfig;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
            _ => IdentityError::InvalidToken(err.to_string()),
        }
    }
}

/// Claims read from an identity provider session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Identity id, the owner key of every row this user creates
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("decoding_key", &"<redacted>")
            .finish()
    }
}

impl IdentityVerifier {
    /// RS256 when a public key is configured, HS256 with the shared secret otherwise
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let (algorithm, decoding_key) = match (&config.jwt_public_key, &config.jwt_secret) {
            (Some(pem), _) => {
                // PEMs passed through env files often carry literal \n
                let pem = pem.replace("\\n", "\n");
                let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
                (Algorithm::RS256, key)
            },
            (None, Some(secret)) => (Algorithm::HS256, DecodingKey::from_secret(secret.as_bytes())),
            (None, None) => {
                return Err(IdentityError::InvalidKey(
                    "no identity verification key configured".to_string(),
                ))
            },
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = config.leeway_secs;
        validation.validate_nbf = true;
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, IdentityError> {
        let data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)?;
        if data.claims.sub.trim().is_empty() {
            return Err(IdentityError::InvalidToken("empty subject".to_string()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "identity-test-secret-at-least-32-characters";

    fn config() -> IdentityConfig {
        IdentityConfig {
            jwt_secret: Some(SECRET.to_string()),
            jwt_public_key: None,
            audience: None,
            issuer: None,
            leeway_secs: 0,
        }
    }

    fn token(sub: &str, exp: u64, secret: &str) -> String {
        let claims = IdentityClaims {
            sub: sub.to_string(),
            exp,
            sid: Some("sess_1".to_string()),
            email: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn now() -> u64 {
        chrono::Utc::now().timestamp() as u64
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = IdentityVerifier::from_config(&config()).unwrap();
        let claims = verifier.verify(&token("user_1", now() + 600, SECRET)).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.sid.as_deref(), Some("sess_1"));
    }

    #[test]
    fn test_rejects_expired_and_forged_tokens() {
        let verifier = IdentityVerifier::from_config(&config()).unwrap();

        assert!(matches!(
            verifier.verify(&token("user_1", now() - 600, SECRET)),
            Err(IdentityError::TokenExpired)
        ));
        assert!(matches!(
            verifier.verify(&token(
                "user_1",
                now() + 600,
                "some-other-secret-of-sufficient-length!"
            )),
            Err(IdentityError::InvalidToken(_))
        ));
        assert!(verifier.verify("not-a-jwt").is_err());
    }

    #[test]
    fn test_audience_is_enforced_when_configured() {
        let mut with_audience = config();
        with_audience.audience = Some("realty-api".to_string());
        let verifier = IdentityVerifier::from_config(&with_audience).unwrap();

        // Token carries no aud claim
        assert!(verifier.verify(&token("user_1", now() + 600, SECRET)).is_err());
    }
}
