//! Authentication: password hashing, session tokens, and the claims extractor.
//!
//! The session credential is a self-contained HS256 JWT carrying the account
//! id and role. Verification is a pure function of the configured secret and
//! the token; it never re-reads the store, so a deleted or role-changed
//! account keeps its old claims until the token expires (the TTL is short
//! for exactly this reason).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    Json,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{Account, AuthResponse, DbPool, LoginRequest, Role, SignupRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password, validate_person_name};

/// Token verification failures, mapped to 401 at the boundary
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No credential was presented")]
    MissingCredential,
    #[error("Credential is not in the expected format")]
    MalformedCredential,
    #[error("Credential signature is invalid or the token has expired")]
    InvalidOrExpired,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::unauthorized(err.to_string())
    }
}

/// Identity claims embedded in the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Gate for admin/manager-only operations
    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "Access denied: admin or manager role required",
            ))
        }
    }
}

/// Sign a session token for the given account
pub fn issue_token(
    secret: &str,
    ttl_secs: i64,
    account_id: &str,
    role: Role,
) -> Result<String, ApiError> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: account_id.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + chrono::Duration::seconds(ttl_secs)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Failed to sign session token: {}", e);
        ApiError::internal("Failed to issue credential")
    })
}

/// Verify a session token and return its claims
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AuthError::MalformedCredential,
            _ => AuthError::InvalidOrExpired,
        }
    })
}

/// Pull the bearer token out of the Authorization header
fn extract_bearer(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedCredential)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)?;
        let claims = verify_token(&state.config.auth.jwt_secret, token)?;
        Ok(claims)
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Signup endpoint. Every new account starts as employee regardless of any
/// role in the payload; elevation goes through the user administration API.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_person_name(&request.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_email(&request.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_password(&request.password) {
        errors.add("password", e);
    }
    errors.finish()?;

    let existing: Option<Account> = sqlx::query_as("SELECT * FROM accounts WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("User already exists").with_status(StatusCode::BAD_REQUEST));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&request.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to create account")
    })?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash, name, role, skills, reward_points, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&request.email)
    .bind(&password_hash)
    .bind(&request.name)
    .bind(Role::Employee.to_string())
    .bind(Account::encode_skills(&request.skills))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(email = %request.email, "Account created");

    let token = issue_token(
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_secs,
        &id,
        Role::Employee,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user_id: id,
            role: Role::Employee.to_string(),
            name: request.name,
        }),
    ))
}

/// Login endpoint. Unknown email and wrong password fail identically.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let account: Option<Account> = sqlx::query_as("SELECT * FROM accounts WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    let account = account.ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;

    if !verify_password(&request.password, &account.password_hash) {
        return Err(ApiError::bad_request("Invalid credentials"));
    }

    let role = account.role_enum();
    let token = issue_token(
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_secs,
        &account.id,
        role,
    )?;

    Ok(Json(AuthResponse {
        token,
        user_id: account.id,
        role: role.to_string(),
        name: account.name,
    }))
}

/// Create the configured admin account if its email is absent. Signup only
/// produces employees, so this is how the first staff account comes to exist.
pub async fn ensure_admin_account(
    pool: &DbPool,
    admin_email: &str,
    admin_password: &str,
) -> anyhow::Result<()> {
    let existing: Option<Account> = sqlx::query_as("SELECT * FROM accounts WHERE email = ?")
        .bind(admin_email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash =
        hash_password(admin_password).map_err(|e| anyhow::anyhow!("password hashing: {}", e))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash, name, role, skills, reward_points, created_at, updated_at)
        VALUES (?, ?, ?, 'Administrator', 'admin', '[]', 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(admin_email)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    tracing::info!(email = %admin_email, "Seeded admin account");
    Ok(())
}
