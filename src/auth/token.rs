use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{models::UserId, AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// HS256 credential checks. Verification is synchronous and never waits on I/O.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Subject id of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> AppResult<UserId> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| AppError::Authentication(format!("invalid token: {err}")))?;

        Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| AppError::Authentication("token subject is not a user id".into()))
    }

    pub fn issue(&self, user_id: UserId, ttl: Duration) -> AppResult<String> {
        let exp = (OffsetDateTime::now_utc() + ttl).unix_timestamp().max(0) as usize;
        let claims = Claims { sub: user_id.to_string(), exp };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AppError::Internal(err.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_to_their_subject() {
        let tokens = TokenVerifier::new(b"test secret");
        let user = Uuid::now_v7();
        let token = tokens.issue(user, Duration::hours(1)).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), user);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = TokenVerifier::new(b"test secret");
        let token = tokens.issue(Uuid::now_v7(), Duration::hours(-1)).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Authentication(_))));
    }

    #[test]
    fn foreign_and_malformed_tokens_are_rejected() {
        let ours = TokenVerifier::new(b"ours");
        let theirs = TokenVerifier::new(b"theirs");
        let token = theirs.issue(Uuid::now_v7(), Duration::hours(1)).unwrap();

        assert!(ours.verify(&token).is_err());
        assert!(ours.verify("not.a.token").is_err());
        assert!(ours.verify("").is_err());
    }

    #[test]
    fn non_uuid_subjects_are_rejected() {
        let tokens = TokenVerifier::new(b"s");
        let exp = (OffsetDateTime::now_utc() + Duration::hours(1)).unix_timestamp() as usize;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Claims { sub: "admin".into(), exp },
            &EncodingKey::from_secret(b"s"),
        )
        .unwrap();

        assert!(matches!(tokens.verify(&token), Err(AppError::Authentication(_))));
    }
}
