pub mod auth;
mod courses;
mod error;
mod profile;
mod projects;
mod users;
mod validation;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub use error::{ApiError, ErrorCode};

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login));

    let api_routes = Router::new()
        // Courses: catalog read is public, everything else checks claims
        .route("/courses", get(courses::list_courses))
        .route("/courses", post(courses::create_course))
        .route("/courses/:id", put(courses::update_course))
        .route("/courses/:id", delete(courses::delete_course))
        .route("/courses/:id/enroll", post(courses::enroll))
        .route("/courses/:id/complete", post(courses::complete))
        // Self-scoped reads
        .route("/users/me/enrolled-courses", get(courses::my_enrolled_courses))
        .route("/users/me/completed-courses", get(courses::my_completed_courses))
        .route("/users/me/projects", get(projects::my_projects))
        // Account administration (admin/manager)
        .route("/users", get(users::list_users))
        .route("/users/:id", put(users::update_user))
        .route("/users/:id", delete(users::delete_user))
        // Projects
        .route("/projects", get(projects::list_projects))
        .route("/projects", post(projects::create_project))
        .route("/projects/:id", get(projects::get_project))
        .route("/projects/:id", put(projects::update_project))
        .route("/projects/:id", delete(projects::delete_project))
        // Profile self-service
        .route("/profile/me", get(profile::get_profile))
        .route("/profile/me", put(profile::update_profile));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
