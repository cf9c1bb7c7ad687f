//! JWT authentication module.
//!
//! Handles token generation and validation, password hashing, and the
//! extractors handlers use to learn who is calling.
//!
//! ## Extractors
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! CurrentUser            401 when missing or invalid
//! Option<CurrentUser>    None when missing, 401 when invalid
//! AdminUser              401 as above, 403 for a cashier
//! ```

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use billdesk_core::{Role, User};
use chrono::{Duration, Utc};
use http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub name: String,
    pub email: String,
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Generate a token for a signed-in user.
    pub fn generate_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!(error = %e, "Rejected token");
            ApiError::unauthorized()
        })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// =============================================================================
// Extractors
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims.sub.parse().map_err(|_| ApiError::unauthorized())?;
        Ok(CurrentUser {
            id,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Reads the caller from the `Authorization` header.
///
/// `Ok(None)` when no bearer token was sent.
fn authenticate(parts: &mut Parts, state: &AppState) -> Result<Option<CurrentUser>, ApiError> {
    if let Some(user) = parts.extensions.get::<CurrentUser>() {
        return Ok(Some(user.clone()));
    }

    let Some(header) = parts.headers.get(http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header.to_str().map_err(|_| ApiError::unauthorized())?;
    let token = extract_bearer_token(header).ok_or_else(ApiError::unauthorized)?;

    let user = CurrentUser::try_from(state.jwt.validate_token(token)?)?;
    parts.extensions.insert(user.clone());
    Ok(Some(user))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)?.ok_or_else(ApiError::unauthorized)
    }
}

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        authenticate(parts, state)
    }
}

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::forbidden());
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user(role: Role) -> User {
        User {
            id: 42,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: String::new(),
            role,
            employee_id: "000042".to_string(),
            store_id: None,
            phone: None,
            address: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            last_active: None,
            is_active: true,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let token = manager.generate_token(&user(Role::Admin)).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, Role::Admin);

        let current = CurrentUser::try_from(claims).unwrap();
        assert_eq!(current.name, "Asha");
        assert!(current.is_admin());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtManager::new("one".to_string(), 3600)
            .generate_token(&user(Role::Cashier))
            .unwrap();
        let result = JwtManager::new("two".to_string(), 3600).validate_token(&token);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s leeway
        let manager = JwtManager::new("test-secret".to_string(), -120);
        let token = manager.generate_token(&user(Role::Cashier)).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("secret1", "not-a-phc-string"));
    }
}
