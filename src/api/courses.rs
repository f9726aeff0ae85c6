//! Course catalog, staff course management, and the enrollment ledger.
//!
//! Enrollment state per (account, course) pair lives in the `enrollments`
//! table: no row means not enrolled, a row with NULL `completed_at` means
//! enrolled, a stamped row means completed. Both transitions are single
//! conditional statements, so two identical concurrent requests cannot both
//! succeed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    Course, CourseFilter, CourseQuery, CourseResponse, CreateCourseRequest, Difficulty,
    UpdateCourseRequest,
};
use crate::AppState;

use super::auth::Claims;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_description, validate_title, validate_uuid};

/// Reward points granted on enrollment
const ENROLL_REWARD_POINTS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    pub msg: String,
    #[serde(rename = "enrolledCourses")]
    pub enrolled_courses: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub msg: String,
    #[serde(rename = "completedCourses")]
    pub completed_courses: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub msg: String,
}

/// List the course catalog with optional filters (public)
///
/// GET /api/courses?skills=&difficulty=&search=
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    let filter = CourseFilter::from_query(&query);
    let matching: Vec<CourseResponse> = courses
        .into_iter()
        .filter(|c| filter.matches(c))
        .map(CourseResponse::from)
        .collect();

    Ok(Json(matching))
}

/// Create a course (admin/manager)
///
/// POST /api/courses
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(req): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
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
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let difficulty = req.difficulty.unwrap_or(Difficulty::AllLevels);

    sqlx::query(
        r#"
        INSERT INTO courses (id, title, description, tags, difficulty, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.title.as_deref().unwrap_or_default())
    .bind(req.description.as_deref().unwrap_or_default())
    .bind(Course::encode_tags(&req.tags))
    .bind(difficulty.to_string())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(course_id = %id, "Course created");

    Ok((StatusCode::CREATED, Json(CourseResponse::from(course))))
}

/// Update a course; absent fields are left untouched (admin/manager)
///
/// PUT /api/courses/:id
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    claims.require_staff()?;

    if let Err(e) = validate_uuid(&id, "course_id") {
        return Err(ApiError::validation_field("course_id", e));
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
    errors.finish()?;

    let _existing = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE courses SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            tags = COALESCE(?, tags),
            difficulty = COALESCE(?, difficulty),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.tags.as_deref().map(Course::encode_tags))
    .bind(req.difficulty.map(|d| d.to_string()))
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(CourseResponse::from(course)))
}

/// Delete a course; enrollment rows go with it (admin/manager)
///
/// DELETE /api/courses/:id
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    claims.require_staff()?;

    if let Err(e) = validate_uuid(&id, "course_id") {
        return Err(ApiError::validation_field("course_id", e));
    }

    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Course not found"));
    }

    tracing::info!(course_id = %id, "Course deleted");

    Ok(Json(DeleteResponse {
        msg: "Course deleted successfully".to_string(),
    }))
}

/// Enroll the caller in a course
///
/// POST /api/courses/:id/enroll
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(course_id): Path<String>,
) -> Result<Json<EnrollResponse>, ApiError> {
    if let Err(e) = validate_uuid(&course_id, "course_id") {
        return Err(ApiError::validation_field("course_id", e));
    }

    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(&course_id)
        .fetch_optional(&state.db)
        .await?;
    if course.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }

    ensure_account_exists(&state, &claims.sub).await?;

    // The UNIQUE(account_id, course_id) index makes this insert the single
    // point of decision; a concurrent duplicate request loses here
    let result = sqlx::query(
        "INSERT OR IGNORE INTO enrollments (id, account_id, course_id, enrolled_at) VALUES (?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&claims.sub)
    .bind(&course_id)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("User already enrolled in this course"));
    }

    sqlx::query("UPDATE accounts SET reward_points = reward_points + ? WHERE id = ?")
        .bind(ENROLL_REWARD_POINTS)
        .bind(&claims.sub)
        .execute(&state.db)
        .await?;

    tracing::info!(account_id = %claims.sub, course_id = %course_id, "Enrolled in course");

    let enrolled_courses = enrolled_course_ids(&state, &claims.sub).await?;

    Ok(Json(EnrollResponse {
        msg: "Successfully enrolled in course".to_string(),
        enrolled_courses,
    }))
}

/// Mark a course the caller is enrolled in as completed
///
/// POST /api/courses/:id/complete
pub async fn complete(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(course_id): Path<String>,
) -> Result<Json<CompleteResponse>, ApiError> {
    if let Err(e) = validate_uuid(&course_id, "course_id") {
        return Err(ApiError::validation_field("course_id", e));
    }

    ensure_account_exists(&state, &claims.sub).await?;

    // Conditional update: only an enrolled-but-not-completed row advances
    let result = sqlx::query(
        "UPDATE enrollments SET completed_at = ? WHERE account_id = ? AND course_id = ? AND completed_at IS NULL",
    )
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&claims.sub)
    .bind(&course_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        // Distinguish never-enrolled from already-completed
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT completed_at FROM enrollments WHERE account_id = ? AND course_id = ?",
        )
        .bind(&claims.sub)
        .bind(&course_id)
        .fetch_optional(&state.db)
        .await?;

        return Err(match row {
            None => ApiError::conflict(
                "User is not enrolled in this course. Cannot mark as complete.",
            ),
            Some(_) => ApiError::conflict("Course already marked as completed."),
        });
    }

    tracing::info!(account_id = %claims.sub, course_id = %course_id, "Course completed");

    let completed_courses = completed_course_ids(&state, &claims.sub).await?;

    Ok(Json(CompleteResponse {
        msg: "Course marked as completed successfully!".to_string(),
        completed_courses,
    }))
}

/// List the caller's enrolled courses, fully resolved
///
/// GET /api/users/me/enrolled-courses
pub async fn my_enrolled_courses(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT c.* FROM courses c
        JOIN enrollments e ON e.course_id = c.id
        WHERE e.account_id = ?
        ORDER BY e.enrolled_at
        "#,
    )
    .bind(&claims.sub)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// List the caller's completed courses, fully resolved
///
/// GET /api/users/me/completed-courses
pub async fn my_completed_courses(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT c.* FROM courses c
        JOIN enrollments e ON e.course_id = c.id
        WHERE e.account_id = ? AND e.completed_at IS NOT NULL
        ORDER BY e.completed_at
        "#,
    )
    .bind(&claims.sub)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// Claims can outlive the account they were issued for; resolve before mutating
async fn ensure_account_exists(state: &AppState, account_id: &str) -> Result<(), ApiError> {
    let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM accounts WHERE id = ?")
        .bind(account_id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(())
}

async fn enrolled_course_ids(state: &AppState, account_id: &str) -> Result<Vec<String>, ApiError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT course_id FROM enrollments WHERE account_id = ? ORDER BY enrolled_at",
    )
    .bind(account_id)
    .fetch_all(&state.db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

async fn completed_course_ids(state: &AppState, account_id: &str) -> Result<Vec<String>, ApiError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT course_id FROM enrollments WHERE account_id = ? AND completed_at IS NOT NULL ORDER BY completed_at",
    )
    .bind(account_id)
    .fetch_all(&state.db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
