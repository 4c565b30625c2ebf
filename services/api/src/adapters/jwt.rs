//! services/api/src/adapters/jwt.rs
//!
//! This module contains the adapter that signs and verifies player session tokens
//! as HS256 JSON Web Tokens. It implements the `SessionTokenService` port from the
//! `core` crate.

use chrono::Utc;
use hunt_core::domain::SessionClaims;
use hunt_core::ports::{PortError, PortResult, SessionTokenService};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// The claim set carried on the wire. Tokens never expire: they are the game state.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenClaims {
    level: u32,
    id_question: Uuid,
    iat: i64,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct JwtSessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionTokens {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

//=========================================================================================
// `SessionTokenService` Trait Implementation
//=========================================================================================

impl SessionTokenService for JwtSessionTokens {
    fn issue(&self, claims: &SessionClaims) -> PortResult<String> {
        let claims = TokenClaims {
            level: claims.level,
            id_question: claims.id_question,
            iat: Utc::now().timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    fn verify(&self, token: &str) -> PortResult<SessionClaims> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            PortError::Unauthorized
        })?;
        Ok(SessionClaims {
            level: data.claims.level,
            id_question: data.claims.id_question,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_the_same_claims() {
        let tokens = JwtSessionTokens::new("s3cret");
        let claims = SessionClaims { level: 4, id_question: Uuid::new_v4() };

        let token = tokens.issue(&claims).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), claims);
    }

    #[test]
    fn token_from_another_secret_is_unauthorized() {
        let claims = SessionClaims { level: 1, id_question: Uuid::new_v4() };
        let token = JwtSessionTokens::new("one").issue(&claims).unwrap();

        let err = JwtSessionTokens::new("two").verify(&token).unwrap_err();
        assert!(matches!(err, PortError::Unauthorized));
    }

    #[test]
    fn garbage_is_unauthorized() {
        let tokens = JwtSessionTokens::new("s3cret");
        for token in ["", "0", "not.a.jwt", "eyJhbGciOiJIUzI1NiJ9.e30.AAAA"] {
            assert!(matches!(tokens.verify(token), Err(PortError::Unauthorized)));
        }
    }

    #[test]
    fn tampered_payload_is_unauthorized() {
        let tokens = JwtSessionTokens::new("s3cret");
        let token = tokens
            .issue(&SessionClaims { level: 0, id_question: Uuid::new_v4() })
            .unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = tokens
            .issue(&SessionClaims { level: 9, id_question: Uuid::new_v4() })
            .unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;

        // Valid header and signature around someone else's payload.
        assert!(matches!(tokens.verify(&parts.join(".")), Err(PortError::Unauthorized)));
    }
}
