use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::Claims;
use crate::{config::JwtConfig, error::ApiError, state::AppState, store::User};

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, user: &User, session_token: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: session_token,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

/// Token from an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let (_scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verified claims of the caller. Rejects with 401 when no token is sent and
/// 403 when it does not verify.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::MissingToken)?;

        let keys = JwtKeys::from_ref(state);
        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err(ApiError::InvalidToken);
            }
        };

        if state.config.session.enforce {
            let session = state.store.find_session(claims.jti).await.map_err(|e| {
                error!(error = %e, "session lookup failed");
                ApiError::database(e)
            })?;
            let now = OffsetDateTime::now_utc();
            match session {
                Some(s) if s.user_id == claims.sub && s.is_live(now) => {
                    debug!(
                        user_id = %claims.sub,
                        session_age_secs = s.age(now).whole_seconds(),
                        "session verified"
                    );
                }
                _ => {
                    warn!(user_id = %claims.sub, "token refers to an inactive session");
                    return Err(ApiError::InvalidToken);
                }
            }
        }

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "nova1".into(),
            email: "nova1@test.io".into(),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
            is_active: true,
        }
    }

    #[test]
    fn sign_and_verify_carries_identity() {
        let keys = keys("dev-secret", "iss", "aud");
        let user = user();
        let session = Uuid::new_v4();
        let token = keys.sign(&user, session).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "nova1");
        assert_eq!(claims.email, "nova1@test.io");
        assert_eq!(claims.jti, session);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = keys("dev-secret", "iss", "aud");
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "nova1".into(),
            email: "nova1@test.io".into(),
            iat: now - 2 * 24 * 60 * 60,
            exp: now - 24 * 60 * 60,
            iss: "iss".into(),
            aud: "aud".into(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_foreign_secret_issuer_or_audience() {
        let token = keys("secret-a", "iss", "aud").sign(&user(), Uuid::new_v4()).unwrap();
        assert!(keys("secret-b", "iss", "aud").verify(&token).is_err());
        assert!(keys("secret-a", "other", "aud").verify(&token).is_err());
        assert!(keys("secret-a", "iss", "other").verify(&token).is_err());
    }

    #[test]
    fn bearer_token_parsing() {
        let req = |value: Option<&str>| {
            let mut builder = axum::http::Request::builder();
            if let Some(v) = value {
                builder = builder.header("authorization", v);
            }
            builder.body(()).unwrap().into_parts().0.headers
        };
        assert_eq!(bearer_token(&req(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&req(Some("Bearer "))), None);
        assert_eq!(bearer_token(&req(Some("Bearer"))), None);
        assert_eq!(bearer_token(&req(None)), None);
    }
}
