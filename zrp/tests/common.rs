// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared test harness: builds a full application against throwaway
//! storage and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use zrp::infrastructure::config::AppConfig;
use zrp::{build_router, AppState};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// A booted application over temp storage. Keep the struct alive for the
/// duration of the test; dropping it removes the directories.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _dir: tempfile::TempDir,
}

pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        database_url: format!("sqlite://{}/zrp.db", dir.display()),
        parts_dir: dir.join("parts").display().to_string(),
        uploads_dir: dir.join("uploads").display().to_string(),
        admin_username: ADMIN_USER.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        session_lifetime_hours: 24,
        request_timeout_secs: 30,
        login_rate_limit: 5,
        api_rate_limit: 100,
        audit_retention_default_days: 365,
        audit_queue_capacity: 1024,
        cors_allow_origin: "*".to_string(),
    }
}

/// Boots a fresh application; the admin account and the default permission
/// matrix are seeded by the composition root.
pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::create_dir_all(dir.path().join("parts")).expect("parts dir");
    let (state, _worker) = AppState::build(test_config(dir.path())).await.expect("app builds");
    let router = build_router(state.clone());
    TestApp {
        state,
        router,
        _dir: dir,
    }
}

/// Writes a catalog CSV relative to the parts directory.
pub fn write_catalog_file(app: &TestApp, relative: &str, content: &str) {
    let path = Path::new(&app.state.config.parts_dir).join(relative);
    fs::create_dir_all(path.parent().unwrap()).expect("category dir");
    fs::write(path, content).expect("catalog file");
}

/// One in-process request. `headers` are (name, value) pairs.
pub async fn send(
    app: &TestApp,
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<serde_json::Value>,
) -> (StatusCode, Response) {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let response = app.router.clone().oneshot(request).await.expect("response");
    (response.status(), response)
}

/// Reads a JSON response body.
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    if bytes.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json body")
}

/// Logs in and returns the `Cookie` header value for follow-up requests.
pub async fn login(app: &TestApp, username: &str, password: &str) -> String {
    let (status, response) = send(
        app,
        Method::POST,
        "/auth/login",
        &[],
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login should succeed");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .expect("cookie utf8");
    set_cookie.split(';').next().expect("cookie pair").to_string()
}

pub async fn login_admin(app: &TestApp) -> String {
    login(app, ADMIN_USER, ADMIN_PASSWORD).await
}

/// Creates an extra account directly through the repositories.
pub async fn create_user(app: &TestApp, username: &str, password: &str, role: &str) {
    let password_hash = zrp::application::services::auth::hash_password(password).expect("hash");
    app.state
        .user_repo
        .create(zrp_domain::repositories::NewUser {
            username: username.to_string(),
            password_hash,
            role: zrp_domain::entities::Role::parse(role),
            active: true,
            email: None,
        })
        .await
        .expect("create user");
}

/// Waits until at least `min` audit rows exist (the queue drains through a
/// background worker, so assertions poll).
pub async fn wait_for_audit_rows(app: &TestApp, min: i64) -> i64 {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        app.state.audit.drain_now().await;
        let count = app.state.audit_repo.count().await.expect("audit count");
        if count >= min || tokio::time::Instant::now() > deadline {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
