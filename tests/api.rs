//! End-to-end tests driving the full router over an in-memory database.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use growhub::config::Config;
use growhub::AppState;

const ADMIN_EMAIL: &str = "admin@growhub.local";
const ADMIN_PASSWORD: &str = "admin-pw";

async fn setup() -> Router {
    let mut config = Config::default();
    config.auth.jwt_secret = "test-secret".to_string();
    config.auth.admin_email = ADMIN_EMAIL.to_string();
    config.auth.admin_password = ADMIN_PASSWORD.to_string();

    let db = growhub::db::init_in_memory().await.unwrap();
    growhub::api::auth::ensure_admin_account(&db, ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();

    growhub::api::create_router(Arc::new(AppState::new(config, db)))
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(value) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": email, "password": password})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn signup_employee(app: &Router, name: &str, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "name": name,
                "email": email,
                "password": "pw",
                "skills": ["SQL"],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["token"].as_str().unwrap().to_string(),
        body["userId"].as_str().unwrap().to_string(),
    )
}

async fn create_course(app: &Router, admin_token: &str, title: &str, tags: Value, difficulty: &str) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/courses",
            Some(admin_token),
            Some(json!({
                "title": title,
                "description": format!("{} description", title),
                "tags": tags,
                "difficulty": difficulty,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn signup_login_enroll_scenario() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let course_id = create_course(&app, &admin_token, "Intro to SQL", json!(["SQL"]), "Beginner").await;

    // Signup returns a token with the employee role, even though the payload
    // asks for admin
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "name": "Ada",
                "email": "ada@x.com",
                "password": "pw",
                "skills": ["SQL"],
                "role": "admin",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "employee");
    assert_eq!(body["name"], "Ada");

    // Login with the same credentials
    let token = login(&app, "ada@x.com", "pw").await;

    // Enroll succeeds once
    let uri = format!("/api/courses/{}/enroll", course_id);
    let (status, body) = send(&app, request("POST", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrolledCourses"], json!([course_id.clone()]));

    // Immediate retry fails with a conflict and does not double-record
    let (status, body) = send(&app, request("POST", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");

    let (status, body) = send(
        &app,
        request("GET", "/api/users/me/enrolled-courses", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Intro to SQL");
}

#[tokio::test]
async fn enrollment_state_machine() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let course_id = create_course(&app, &admin_token, "Rust 101", json!(["Rust"]), "Beginner").await;
    let (token, _) = signup_employee(&app, "Grace", "grace@x.com").await;

    let complete_uri = format!("/api/courses/{}/complete", course_id);
    let enroll_uri = format!("/api/courses/{}/enroll", course_id);

    // Complete before enroll fails
    let (status, body) = send(&app, request("POST", &complete_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("not enrolled"));

    // Enroll, then complete succeeds
    let (status, _) = send(&app, request("POST", &enroll_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, request("POST", &complete_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completedCourses"], json!([course_id.clone()]));

    // Second complete fails
    let (status, body) = send(&app, request("POST", &complete_uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("already marked as completed"));

    // Completion is additive: the course stays in the enrolled list too
    let (_, enrolled) = send(
        &app,
        request("GET", "/api/users/me/enrolled-courses", Some(&token), None),
    )
    .await;
    assert_eq!(enrolled.as_array().unwrap().len(), 1);
    let (_, completed) = send(
        &app,
        request("GET", "/api/users/me/completed-courses", Some(&token), None),
    )
    .await;
    assert_eq!(completed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn enroll_grants_reward_points() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let course_id = create_course(&app, &admin_token, "ETL basics", json!([]), "Beginner").await;
    let (token, _) = signup_employee(&app, "Joan", "joan@x.com").await;

    let uri = format!("/api/courses/{}/enroll", course_id);
    send(&app, request("POST", &uri, Some(&token), None)).await;

    let (status, body) = send(&app, request("GET", "/api/profile/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rewardPoints"], 10);
}

#[tokio::test]
async fn enroll_in_missing_course_is_not_found() {
    let app = setup().await;
    let (token, _) = signup_employee(&app, "Ada", "ada@x.com").await;

    let uri = format!("/api/courses/{}/enroll", uuid::Uuid::new_v4());
    let (status, _) = send(&app, request("POST", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Malformed course reference is rejected before any lookup
    let (status, body) = send(
        &app,
        request("POST", "/api/courses/not-a-uuid/enroll", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn employee_is_rejected_from_staff_endpoints() {
    let app = setup().await;
    let (token, user_id) = signup_employee(&app, "Eve", "eve@x.com").await;

    let attempts = [
        request(
            "POST",
            "/api/courses",
            Some(&token),
            Some(json!({"title": "T", "description": "D"})),
        ),
        request("GET", "/api/users", Some(&token), None),
        request(
            "PUT",
            &format!("/api/users/{}", user_id),
            Some(&token),
            Some(json!({"role": "admin"})),
        ),
        request(
            "POST",
            "/api/projects",
            Some(&token),
            Some(json!({"title": "T", "description": "D"})),
        ),
    ];

    for attempt in attempts {
        let (status, body) = send(&app, attempt).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "forbidden");
    }
}

#[tokio::test]
async fn missing_or_bad_credentials_are_unauthorized() {
    let app = setup().await;

    let (status, body) = send(&app, request("GET", "/api/profile/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = send(
        &app,
        request("GET", "/api/profile/me", Some("garbage"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Catalog read stays public
    let (status, _) = send(&app, request("GET", "/api/courses", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let app = setup().await;
    signup_employee(&app, "Ada", "ada@x.com").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"name": "Ada 2", "email": "ada@x.com", "password": "pw"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let app = setup().await;
    signup_employee(&app, "Ada", "ada@x.com").await;

    for payload in [
        json!({"email": "nobody@x.com", "password": "pw"}),
        json!({"email": "ada@x.com", "password": "wrong"}),
    ] {
        let (status, body) = send(&app, request("POST", "/api/auth/login", None, Some(payload))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn course_filters_compose_with_and() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    create_course(&app, &admin_token, "foo SQL basics", json!(["SQL"]), "Beginner").await;
    create_course(&app, &admin_token, "foo SQL deep dive", json!(["SQL"]), "Advanced").await;
    create_course(&app, &admin_token, "Rust foo", json!(["Rust"]), "Beginner").await;

    let (status, body) = send(
        &app,
        request(
            "GET",
            "/api/courses?skills=SQL&difficulty=Beginner&search=foo",
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let matches = body.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["title"], "foo SQL basics");

    // No filters returns the full catalog
    let (_, body) = send(&app, request("GET", "/api/courses", None, None)).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    // The "All" sentinel imposes no difficulty constraint
    let (_, body) = send(
        &app,
        request("GET", "/api/courses?difficulty=All", None, None),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn partial_course_update_touches_only_present_fields() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let course_id = create_course(&app, &admin_token, "Rust 101", json!(["Rust"]), "Beginner").await;

    let uri = format!("/api/courses/{}", course_id);
    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&admin_token), Some(json!({"difficulty": "Advanced"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["difficulty"], "Advanced");
    assert_eq!(body["title"], "Rust 101");
    assert_eq!(body["description"], "Rust 101 description");
    assert_eq!(body["tags"], json!(["Rust"]));

    // An explicit empty array clears the tag set
    let (_, body) = send(
        &app,
        request("PUT", &uri, Some(&admin_token), Some(json!({"tags": []}))),
    )
    .await;
    assert_eq!(body["tags"], json!([]));
    assert_eq!(body["title"], "Rust 101");
}

#[tokio::test]
async fn course_create_requires_title_and_description() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/courses",
            Some(&admin_token),
            Some(json!({"tags": ["SQL"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    let details = &body["error"]["details"];
    assert!(details["title"].is_array());
    assert!(details["description"].is_array());
}

#[tokio::test]
async fn role_elevation_by_staff() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (_, user_id) = signup_employee(&app, "Ada", "ada@x.com").await;

    let uri = format!("/api/users/{}", user_id);
    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&admin_token), Some(json!({"role": "manager"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "manager");

    // A fresh login carries the new role; the manager can now create courses
    let token = login(&app, "ada@x.com", "pw").await;
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/courses",
            Some(&token),
            Some(json!({"title": "T", "description": "D"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn user_list_redacts_secrets() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    signup_employee(&app, "Ada", "ada@x.com").await;

    let (status, body) = send(&app, request("GET", "/api/users", Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    for user in body.as_array().unwrap() {
        assert!(user.get("password_hash").is_none());
        assert!(user.get("password").is_none());
    }
}

#[tokio::test]
async fn project_lifecycle_and_self_scoped_reads() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (ada_token, ada_id) = signup_employee(&app, "Ada", "ada@x.com").await;
    let (bob_token, _) = signup_employee(&app, "Bob", "bob@x.com").await;

    // Create a project assigned to Ada
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/projects",
            Some(&admin_token),
            Some(json!({
                "title": "Data migration",
                "description": "Move the data",
                "requiredSkills": ["SQL"],
                "assignedEmployees": [ada_id],
                "deadline": "2026-12-01",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Not Started");
    let project_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["assignedEmployees"][0]["name"], "Ada");
    assert!(body["assignedEmployees"][0].get("password_hash").is_none());

    // Any authenticated role can read the full list and a single project
    let (status, body) = send(&app, request("GET", "/api/projects", Some(&bob_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    let uri = format!("/api/projects/{}", project_id);
    let (status, _) = send(&app, request("GET", &uri, Some(&bob_token), None)).await;
    assert_eq!(status, StatusCode::OK);

    // Self-scoped list only shows assigned projects
    let (_, ada_projects) = send(
        &app,
        request("GET", "/api/users/me/projects", Some(&ada_token), None),
    )
    .await;
    assert_eq!(ada_projects.as_array().unwrap().len(), 1);
    let (_, bob_projects) = send(
        &app,
        request("GET", "/api/users/me/projects", Some(&bob_token), None),
    )
    .await;
    assert_eq!(bob_projects.as_array().unwrap().len(), 0);

    // Partial update: status only
    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&admin_token), Some(json!({"status": "In Progress"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "In Progress");
    assert_eq!(body["title"], "Data migration");
    assert_eq!(body["assignedEmployees"][0]["name"], "Ada");

    // Delete, then reads fail
    let (status, _) = send(&app, request("DELETE", &uri, Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, request("GET", &uri, Some(&bob_token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_assignee_update_leaves_project_untouched() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (_, ada_id) = signup_employee(&app, "Ada", "ada@x.com").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/projects",
            Some(&admin_token),
            Some(json!({
                "title": "Data migration",
                "description": "Move the data",
                "assignedEmployees": [ada_id],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = body["id"].as_str().unwrap().to_string();
    let uri = format!("/api/projects/{}", project_id);

    // An unknown (but well-formed) assignee id fails the update outright
    let (status, _) = send(
        &app,
        request(
            "PUT",
            &uri,
            Some(&admin_token),
            Some(json!({
                "title": "Renamed",
                "assignedEmployees": [uuid::Uuid::new_v4().to_string()],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A malformed assignee id fails validation
    let (status, _) = send(
        &app,
        request(
            "PUT",
            &uri,
            Some(&admin_token),
            Some(json!({"assignedEmployees": ["not-a-uuid"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Neither failed update mutated anything: assignments and fields intact
    let (_, body) = send(&app, request("GET", &uri, Some(&admin_token), None)).await;
    assert_eq!(body["title"], "Data migration");
    let assignees = body["assignedEmployees"].as_array().unwrap();
    assert_eq!(assignees.len(), 1);
    assert_eq!(assignees[0]["name"], "Ada");
}

#[tokio::test]
async fn create_with_unknown_assignee_persists_nothing() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/projects",
            Some(&admin_token),
            Some(json!({
                "title": "Orphan",
                "description": "Should not exist",
                "assignedEmployees": [uuid::Uuid::new_v4().to_string()],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, request("GET", "/api/projects", Some(&admin_token), None)).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn empty_deadline_reads_back_as_null() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    // Empty string on create means no deadline
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/projects",
            Some(&admin_token),
            Some(json!({"title": "T", "description": "D", "deadline": ""})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["deadline"].is_null());
    let uri = format!("/api/projects/{}", body["id"].as_str().unwrap());

    // A real value sets it; an absent field keeps it; an empty string clears it
    let (_, body) = send(
        &app,
        request("PUT", &uri, Some(&admin_token), Some(json!({"deadline": "2026-12-01"}))),
    )
    .await;
    assert_eq!(body["deadline"], "2026-12-01");

    let (_, body) = send(
        &app,
        request("PUT", &uri, Some(&admin_token), Some(json!({"status": "On Hold"}))),
    )
    .await;
    assert_eq!(body["deadline"], "2026-12-01");

    let (_, body) = send(
        &app,
        request("PUT", &uri, Some(&admin_token), Some(json!({"deadline": ""}))),
    )
    .await;
    assert!(body["deadline"].is_null());
}

#[tokio::test]
async fn profile_update_cannot_touch_role() {
    let app = setup().await;
    let (token, _) = signup_employee(&app, "Ada", "ada@x.com").await;

    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/profile/me",
            Some(&token),
            Some(json!({"name": "Ada L.", "skills": ["SQL", "Rust"], "role": "admin"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ada L.");
    assert_eq!(body["skills"], json!(["SQL", "Rust"]));
    // The unknown role field is ignored by the self-service shape
    assert_eq!(body["role"], "employee");
}

#[tokio::test]
async fn deleting_a_course_cleans_enrollment_references() {
    let app = setup().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let course_id = create_course(&app, &admin_token, "Doomed", json!([]), "Beginner").await;
    let (token, _) = signup_employee(&app, "Ada", "ada@x.com").await;

    let enroll_uri = format!("/api/courses/{}/enroll", course_id);
    send(&app, request("POST", &enroll_uri, Some(&token), None)).await;

    let uri = format!("/api/courses/{}", course_id);
    let (status, _) = send(&app, request("DELETE", &uri, Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, enrolled) = send(
        &app,
        request("GET", "/api/users/me/enrolled-courses", Some(&token), None),
    )
    .await;
    assert_eq!(enrolled.as_array().unwrap().len(), 0);
}
