// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Audit trail: before/after diffs, client-IP capture, retention policy,
//! cleanup and CSV export.

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};

use zrp_domain::repositories::AuditQuery;

use crate::common::*;

#[tokio::test]
async fn test_update_records_diff_and_client_ip() {
    let app = spawn_app().await;
    create_user(&app, "target", "a-decent-password", "user").await;
    let cookie = login_admin(&app).await;
    let user = app.state.user_repo.find_by_username("target").await.unwrap().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/users/{}", user.id),
        &[("cookie", &cookie), ("x-forwarded-for", "203.0.113.77, 10.0.0.1")],
        Some(serde_json::json!({ "role": "readonly" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    wait_for_audit_rows(&app, 1).await;
    let entries = app
        .state
        .audit_repo
        .list(&AuditQuery {
            action: Some("UPDATE".to_string()),
            record_id: Some(user.id.to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!entries.is_empty(), "expected an UPDATE entry");

    let entry = &entries[0];
    assert_eq!(entry.username, ADMIN_USER);
    assert_eq!(entry.ip_address, "203.0.113.77", "first X-Forwarded-For value wins");

    let before: serde_json::Value = serde_json::from_str(entry.before_value.as_deref().unwrap()).unwrap();
    let after: serde_json::Value = serde_json::from_str(entry.after_value.as_deref().unwrap()).unwrap();
    assert_eq!(before["role"], "user");
    assert_eq!(after["role"], "readonly");
    assert!(before.get("username").is_none(), "diff keeps only changed fields");
}

#[tokio::test]
async fn test_retention_bounds_and_policy_round_trip() {
    let app = spawn_app().await;
    let cookie = login_admin(&app).await;

    // Out of bounds both ways.
    for days in [10, 5000] {
        let (status, response) = send(
            &app,
            Method::PUT,
            "/api/v1/audit/retention",
            &[("cookie", &cookie)],
            Some(serde_json::json!({ "retention_days": days })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BAD_REQUEST");
    }

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/audit/retention",
        &[("cookie", &cookie)],
        Some(serde_json::json!({ "retention_days": 90 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = send(&app, Method::GET, "/api/v1/audit/retention", &[("cookie", &cookie)], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["retention_days"], 90);
}

#[tokio::test]
async fn test_cleanup_purges_only_entries_past_the_cutoff() {
    let app = spawn_app().await;
    let cookie = login_admin(&app).await;

    // Two synthetic rows: one ancient, one recent.
    let ancient = Utc::now() - Duration::days(400);
    for (created_at, summary) in [(ancient, "ancient"), (Utc::now(), "recent")] {
        sqlx::query(
            "INSERT INTO audit_log (username, action, module, record_id, summary, created_at) \
             VALUES ('seed', 'UPDATE', 'parts', 'X', ?, ?)",
        )
        .bind(summary)
        .bind(created_at)
        .execute(&app.state.pool)
        .await
        .unwrap();
    }

    let (status, response) = send(
        &app,
        Method::POST,
        "/api/v1/audit/cleanup",
        &[("cookie", &cookie)],
        Some(serde_json::json!({ "retention_days": 365 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["deleted"], 1);

    wait_for_audit_rows(&app, 1).await;
    let remaining = app.state.audit_repo.list(&AuditQuery::default()).await.unwrap();
    assert!(remaining.iter().any(|e| e.summary == "recent"));
    assert!(!remaining.iter().any(|e| e.summary == "ancient"));
}

#[tokio::test]
async fn test_export_streams_csv_and_is_itself_audited() {
    let app = spawn_app().await;
    let cookie = login_admin(&app).await;

    app.state.audit.log(
        "seed",
        zrp_domain::entities::AuditAction::Create,
        "parts",
        "RES-0001",
        "seeded for export",
    );
    wait_for_audit_rows(&app, 1).await;

    let (status, response) = send(&app, Method::GET, "/api/v1/audit/export", &[("cookie", &cookie)], None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.headers()["content-type"].to_str().unwrap().starts_with("text/csv"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("id,user_id,username,action,module"));
    assert!(text.contains("seeded for export"));

    wait_for_audit_rows(&app, 2).await;
    let exports = app
        .state
        .audit_repo
        .list(&AuditQuery {
            action: Some("EXPORT".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(exports.len(), 1, "the export itself lands in the trail");
}

#[tokio::test]
async fn test_queue_drops_oldest_at_capacity() {
    let app = spawn_app().await;

    // Flood far past capacity; the recorder must neither block nor error,
    // and the newest entries must survive.
    for i in 0..2000 {
        app.state.audit.log(
            "flood",
            zrp_domain::entities::AuditAction::Update,
            "inventory",
            &i.to_string(),
            &format!("movement {}", i),
        );
    }
    app.state.audit.drain_now().await;

    let entries = app
        .state
        .audit_repo
        .list(&AuditQuery {
            username: Some("flood".to_string()),
            limit: Some(5000),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!entries.is_empty());
    assert!(entries.iter().any(|e| e.record_id == "1999"), "newest entry survives");
}
