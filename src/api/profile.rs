//! Self-service profile endpoints. Self-scoped: the acting account can only
//! touch its own record, and only name and skills are editable here.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::{Account, AccountResponse, UpdateProfileRequest};
use crate::AppState;

use super::auth::Claims;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::validate_person_name;

/// Read the caller's own profile, secret redacted
///
/// GET /api/profile/me
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
        .bind(&claims.sub)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(AccountResponse::from(account)))
}

/// Update the caller's own name and/or skills
///
/// PUT /api/profile/me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        if let Err(e) = validate_person_name(name) {
            errors.add("name", e);
        }
    }
    errors.finish()?;

    let _existing = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
        .bind(&claims.sub)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE accounts SET
            name = COALESCE(?, name),
            skills = COALESCE(?, skills),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(req.skills.as_deref().map(Account::encode_skills))
    .bind(&now)
    .bind(&claims.sub)
    .execute(&state.db)
    .await?;

    let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
        .bind(&claims.sub)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(AccountResponse::from(account)))
}
