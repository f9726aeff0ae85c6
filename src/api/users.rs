//! Account administration endpoints (admin/manager only).

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::{Account, AccountResponse, UpdateAccountRequest};
use crate::AppState;

use super::auth::Claims;
use super::courses::DeleteResponse;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_person_name, validate_uuid};

/// List all accounts, secrets redacted
///
/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    claims.require_staff()?;

    let accounts = sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY created_at")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(
        accounts.into_iter().map(AccountResponse::from).collect(),
    ))
}

/// Update an account's name, skills, or role; absent fields are left untouched
///
/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    claims.require_staff()?;

    if let Err(e) = validate_uuid(&id, "user_id") {
        return Err(ApiError::validation_field("user_id", e));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        if let Err(e) = validate_person_name(name) {
            errors.add("name", e);
        }
    }
    errors.finish()?;

    let _existing = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE accounts SET
            name = COALESCE(?, name),
            skills = COALESCE(?, skills),
            role = COALESCE(?, role),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(req.skills.as_deref().map(Account::encode_skills))
    .bind(req.role.map(|r| r.to_string()))
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    if req.role.is_some() {
        tracing::info!(user_id = %id, role = %account.role, "Account role changed");
    }

    Ok(Json(AccountResponse::from(account)))
}

/// Delete an account; its enrollments and assignments go with it
///
/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    claims.require_staff()?;

    if let Err(e) = validate_uuid(&id, "user_id") {
        return Err(ApiError::validation_field("user_id", e));
    }

    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %id, "Account deleted");

    Ok(Json(DeleteResponse {
        msg: "User deleted successfully".to_string(),
    }))
}
