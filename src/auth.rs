use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::AppState;
use crate::constants::*;
use crate::error::{AppError, ValidJson};
use crate::models::{LoginPayload, LoginResponse, PublicUser, RegisterUserPayload, User};
use crate::users::{
    ensure_user_unique, get_user_by_email, get_user_by_id, insert_user, validate_user_fields,
};
use crate::utils::{validate_email, validate_password, validate_password_confirmation};

/// Token payload: the id of the authenticated user and the expiry as a unix timestamp.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub exp: usize,
}

/// Signing material for access tokens, built once from configuration.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: Duration,
}

impl AuthKeys {
    pub fn from_secret(secret: &[u8], token_expiry_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            token_ttl: Duration::hours(token_expiry_hours),
        }
    }

    pub fn issue_token(&self, user_id: i64) -> Result<String, AppError> {
        let expires_at = OffsetDateTime::now_utc() + self.token_ttl;
        let claims = Claims {
            id: user_id,
            exp: expires_at.unix_timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::internal(format!("failed to sign token: {}", e)))
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify_token(&self, token: &str) -> Result<i64, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.id)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected access token");
                AppError::Unauthorized
            })
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AppError::internal(format!("stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// The authenticated user making the request.
///
/// Extracting it from a `Bearer` token is the only way a protected handler
/// learns who is calling; missing, malformed, expired or orphaned tokens are
/// all answered with 401.
#[derive(Debug, Clone)]
pub struct Principal(pub User);

impl Principal {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let user_id = state.auth.verify_token(token)?;
        let user = get_user_by_id(&state.main_db, user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(Principal(user))
    }
}

pub async fn register(
    State(app_state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterUserPayload>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    validate_user_fields(
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        payload.cpf.as_deref(),
        payload.phone.as_deref(),
    )?;
    validate_password(&payload.password, "password")?;
    validate_password_confirmation(
        &payload.password,
        &payload.confirm_password,
        "confirmPassword",
    )?;

    let password_hash = hash_password(&payload.password)?;

    let user = {
        let conn = app_state.main_db.write().await;
        ensure_user_unique(
            &conn,
            payload.email.trim(),
            payload.cpf.as_deref().map(str::trim),
            None,
        )
        .await?;
        insert_user(&conn, &payload, password_hash).await?
    };

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

pub async fn login(
    State(app_state): State<AppState>,
    ValidJson(payload): ValidJson<LoginPayload>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    validate_email(&payload.email)?;
    validate_password(&payload.password, "password")?;

    let invalid = || AppError::validation("data", ERR_INVALID_CREDENTIALS);

    let user = get_user_by_email(&app_state.main_db, payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = app_state.auth.issue_token(user.id)?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            user: PublicUser::from(user),
            token,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"unit-test-secret-unit-test-secret";

    #[test]
    fn issued_tokens_verify_to_the_same_user() {
        let keys = AuthKeys::from_secret(SECRET, 8);
        let token = keys.issue_token(42).unwrap();
        assert_eq!(keys.verify_token(&token).unwrap(), 42);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let keys = AuthKeys::from_secret(SECRET, 8);
        let other = AuthKeys::from_secret(b"another-secret-another-secret-xx", 8);
        let token = other.issue_token(42).unwrap();
        assert!(matches!(
            keys.verify_token(&token),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            keys.verify_token("not-a-token"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = AuthKeys::from_secret(SECRET, -2);
        let token = keys.issue_token(7).unwrap();
        assert!(keys.verify_token(&token).is_err());
    }

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("secret123").unwrap();
        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
