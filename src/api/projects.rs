//! Project endpoints: staff CRUD plus self-scoped assignment reads.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    AccountSummary, CreateProjectRequest, Project, ProjectResponse, ProjectStatus,
    UpdateProjectRequest,
};
use crate::AppState;

use super::auth::Claims;
use super::courses::DeleteResponse;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_deadline, validate_description, validate_title, validate_uuid};

/// Resolve a project's assignees to name/email summaries
async fn load_assignees(
    state: &AppState,
    project_id: &str,
) -> Result<Vec<AccountSummary>, ApiError> {
    let assignees = sqlx::query_as::<_, AccountSummary>(
        r#"
        SELECT a.id, a.name, a.email FROM accounts a
        JOIN project_assignments pa ON pa.account_id = a.id
        WHERE pa.project_id = ?
        ORDER BY pa.created_at
        "#,
    )
    .bind(project_id)
    .fetch_all(&state.db)
    .await?;
    Ok(assignees)
}

/// Check every incoming assignee id (shape and existence). Runs before any
/// write so a bad id cannot leave a project half-mutated.
async fn validate_assignees(state: &AppState, account_ids: &[String]) -> Result<(), ApiError> {
    for account_id in account_ids {
        if let Err(e) = validate_uuid(account_id, "assignedEmployees") {
            return Err(ApiError::validation_field("assignedEmployees", e));
        }
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM accounts WHERE id = ?")
            .bind(account_id)
            .fetch_optional(&state.db)
            .await?;
        if exists.is_none() {
            return Err(ApiError::not_found(format!(
                "Assigned employee {} not found",
                account_id
            )));
        }
    }
    Ok(())
}

/// Replace a project's assignment set with the given account ids. Ids must
/// already be validated; delete and inserts commit atomically.
async fn replace_assignments(
    state: &AppState,
    project_id: &str,
    account_ids: &[String],
) -> Result<(), ApiError> {
    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM project_assignments WHERE project_id = ?")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

    for account_id in account_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO project_assignments (id, project_id, account_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(project_id)
        .bind(account_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

async fn load_response(state: &AppState, project: Project) -> Result<ProjectResponse, ApiError> {
    let assignees = load_assignees(state, &project.id).await?;
    Ok(ProjectResponse::new(project, assignees))
}

/// List all projects (any authenticated role)
///
/// GET /api/projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    let mut results = Vec::with_capacity(projects.len());
    for project in projects {
        results.push(load_response(&state, project).await?);
    }

    Ok(Json(results))
}

/// Get a single project (any authenticated role)
///
/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    if let Err(e) = validate_uuid(&id, "project_id") {
        return Err(ApiError::validation_field("project_id", e));
    }

    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    Ok(Json(load_response(&state, project).await?))
}

/// List the projects the caller is assigned to
///
/// GET /api/users/me/projects
pub async fn my_projects(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = sqlx::query_as::<_, Project>(
        r#"
        SELECT p.* FROM projects p
        JOIN project_assignments pa ON pa.project_id = p.id
        WHERE pa.account_id = ?
        ORDER BY p.created_at DESC
        "#,
    )
    .bind(&claims.sub)
    .fetch_all(&state.db)
    .await?;

    let mut results = Vec::with_capacity(projects.len());
    for project in projects {
        results.push(load_response(&state, project).await?);
    }

    Ok(Json(results))
}

/// Create a project (admin/manager)
///
/// POST /api/projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    claims.require_staff()?;

    let mut errors = ValidationErrorBuilder::new();
    match req.title.as_deref() {
        Some(title) => {
            if let Err(e) = validate_title(title) {
                errors.add("title", e);
            }
        }
        None => {
            errors.add("title", "Title is required");
        }
    }
    match req.description.as_deref() {
        Some(description) => {
            if let Err(e) = validate_description(description) {
                errors.add("description", e);
            }
        }
        None => {
            errors.add("description", "Description is required");
        }
    }
    if let Err(e) = validate_deadline(&req.deadline) {
        errors.add("deadline", e);
    }
    errors.finish()?;

    // All assignees must resolve before the project row is written
    validate_assignees(&state, &req.assigned_employees).await?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let status = req.status.unwrap_or(ProjectStatus::NotStarted);
    // Empty string means "no deadline"
    let deadline = req.deadline.as_deref().filter(|d| !d.is_empty());

    sqlx::query(
        r#"
        INSERT INTO projects (id, title, description, required_skills, status, deadline, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.title.as_deref().unwrap_or_default())
    .bind(req.description.as_deref().unwrap_or_default())
    .bind(Project::encode_skills(&req.required_skills))
    .bind(status.to_string())
    .bind(deadline)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    if !req.assigned_employees.is_empty() {
        replace_assignments(&state, &id, &req.assigned_employees).await?;
    }

    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(project_id = %id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(load_response(&state, project).await?),
    ))
}

/// Update a project; absent fields are left untouched (admin/manager)
///
/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    claims.require_staff()?;

    if let Err(e) = validate_uuid(&id, "project_id") {
        return Err(ApiError::validation_field("project_id", e));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref title) = req.title {
        if let Err(e) = validate_title(title) {
            errors.add("title", e);
        }
    }
    if let Some(ref description) = req.description {
        if let Err(e) = validate_description(description) {
            errors.add("description", e);
        }
    }
    if let Err(e) = validate_deadline(&req.deadline) {
        errors.add("deadline", e);
    }
    errors.finish()?;

    let _existing = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    // All assignees must resolve before anything is written
    if let Some(ref assigned) = req.assigned_employees {
        validate_assignees(&state, assigned).await?;
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE projects SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            required_skills = COALESCE(?, required_skills),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.required_skills.as_deref().map(Project::encode_skills))
    .bind(req.status.map(|s| s.to_string()))
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    // Deadline is tri-state: absent keeps, empty string clears, value sets
    if let Some(ref deadline) = req.deadline {
        sqlx::query("UPDATE projects SET deadline = ? WHERE id = ?")
            .bind(Some(deadline.as_str()).filter(|d| !d.is_empty()))
            .bind(&id)
            .execute(&state.db)
            .await?;
    }

    if let Some(ref assigned) = req.assigned_employees {
        replace_assignments(&state, &id, assigned).await?;
    }

    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(load_response(&state, project).await?))
}

/// Delete a project; its assignments go with it (admin/manager)
///
/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    claims.require_staff()?;

    if let Err(e) = validate_uuid(&id, "project_id") {
        return Err(ApiError::validation_field("project_id", e));
    }

    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Project not found"));
    }

    tracing::info!(project_id = %id, "Project deleted");

    Ok(Json(DeleteResponse {
        msg: "Project removed".to_string(),
    }))
}
