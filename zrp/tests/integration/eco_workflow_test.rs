// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end ECO workflow: draft changes → ECO → approve → implement,
//! CSV rewrite, rename cascade, rejection paths and idempotence.

use axum::http::{Method, StatusCode};

use crate::common::*;

const RESISTORS: &str = "IPN,Description,Cost\nRES-0001,Old,10.50\nRES-0002,Spare,1.00\n";

async fn post(app: &TestApp, cookie: &str, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let (status, response) = send(app, Method::POST, path, &[("cookie", cookie)], Some(body)).await;
    (status, json_body(response).await)
}

async fn create_two_changes(app: &TestApp, cookie: &str) {
    let (status, _) = post(
        app,
        cookie,
        "/api/v1/parts/RES-0001/changes",
        serde_json::json!({ "field_name": "Description", "new_value": "New" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(
        app,
        cookie,
        "/api/v1/parts/RES-0001/changes",
        serde_json::json!({ "field_name": "Cost", "new_value": "12.00" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_approve_implement_flow() {
    let app = spawn_app().await;
    write_catalog_file(&app, "resistors/resistors.csv", RESISTORS);
    let cookie = login_admin(&app).await;

    create_two_changes(&app, &cookie).await;

    // Draft changes captured the old values from the catalog.
    let (_, response) = send(&app, Method::GET, "/api/v1/parts/RES-0001/changes", &[("cookie", &cookie)], None).await;
    let body = json_body(response).await;
    let changes = body["data"].as_array().unwrap();
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|c| c["status"] == "draft"));
    assert!(changes.iter().any(|c| c["old_value"] == "Old"));

    let (status, body) = post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0001/changes/create-eco",
        serde_json::json!({ "title": "E1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let eco_id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(eco_id.starts_with("ECO-"), "generated id: {}", eco_id);
    assert_eq!(body["data"]["status"], "draft");

    // Both changes are now pending under the ECO.
    let pending = app.state.change_repo.pending_for_eco(&eco_id).await.unwrap();
    assert_eq!(pending.len(), 2);

    let (status, _) = post(&app, &cookie, &format!("/api/v1/ecos/{}/submit", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = post(&app, &cookie, &format!("/api/v1/ecos/{}/approve", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["approved_by"], ADMIN_USER);

    let (status, body) = post(&app, &cookie, &format!("/api/v1/ecos/{}/implement", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["eco"]["status"], "implemented");
    assert_eq!(body["data"]["summary"]["applied"].as_array().unwrap().len(), 2);
    assert!(body["data"]["summary"]["errors"].as_array().unwrap().is_empty());

    // The catalog row was rewritten; the sibling row was not.
    let location = app.state.catalog.find_part("RES-0001").unwrap().unwrap();
    let row = location.file.row_as_map(location.row);
    assert_eq!(row["Description"], "New");
    assert_eq!(row["Cost"], "12.00");
    let spare = app.state.catalog.find_part("RES-0002").unwrap().unwrap();
    assert_eq!(spare.file.row_as_map(spare.row)["Description"], "Spare");

    // Changes are terminal-applied and the trail recorded the journey.
    let changes = app.state.change_repo.pending_for_eco(&eco_id).await.unwrap();
    assert!(changes.is_empty());
    let count = wait_for_audit_rows(&app, 4).await;
    assert!(count >= 4, "expected at least 4 audit entries, got {}", count);
}

#[tokio::test]
async fn test_create_eco_with_no_drafts_is_bad_request() {
    let app = spawn_app().await;
    write_catalog_file(&app, "resistors/resistors.csv", RESISTORS);
    let cookie = login_admin(&app).await;

    let (status, body) = post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0001/changes/create-eco",
        serde_json::json!({ "title": "empty" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_implement_requires_approved_state() {
    let app = spawn_app().await;
    write_catalog_file(&app, "resistors/resistors.csv", RESISTORS);
    let cookie = login_admin(&app).await;

    create_two_changes(&app, &cookie).await;
    let (_, body) = post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0001/changes/create-eco",
        serde_json::json!({ "title": "E1" }),
    )
    .await;
    let eco_id = body["data"]["id"].as_str().unwrap().to_string();

    // draft → implement is illegal; the catalog must stay untouched.
    let (status, _) = post(&app, &cookie, &format!("/api/v1/ecos/{}/implement", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let location = app.state.catalog.find_part("RES-0001").unwrap().unwrap();
    assert_eq!(location.file.row_as_map(location.row)["Description"], "Old");
}

#[tokio::test]
async fn test_reject_returns_changes_to_terminal_rejected() {
    let app = spawn_app().await;
    write_catalog_file(&app, "resistors/resistors.csv", RESISTORS);
    let cookie = login_admin(&app).await;

    create_two_changes(&app, &cookie).await;
    let (_, body) = post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0001/changes/create-eco",
        serde_json::json!({ "title": "doomed" }),
    )
    .await;
    let eco_id = body["data"]["id"].as_str().unwrap().to_string();

    post(&app, &cookie, &format!("/api/v1/ecos/{}/submit", eco_id), serde_json::json!({})).await;
    let (status, _) = post(&app, &cookie, &format!("/api/v1/ecos/{}/reject", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let eco = app.state.ecos.get(&eco_id).await.unwrap();
    assert_eq!(eco.status, zrp_domain::entities::EcoStatus::Rejected);
    let rejected = app
        .state
        .change_repo
        .list(&zrp_domain::repositories::ChangeFilter {
            eco_id: Some(eco_id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(rejected.iter().all(|c| c.status == zrp_domain::entities::ChangeStatus::Rejected));

    // Re-running the rejection of changes is a no-op.
    assert_eq!(app.state.ecos.reject_part_changes_for_eco(&eco_id).await.unwrap(), 0);

    // And the catalog never changed.
    let location = app.state.catalog.find_part("RES-0001").unwrap().unwrap();
    assert_eq!(location.file.row_as_map(location.row)["Description"], "Old");
}

#[tokio::test]
async fn test_double_implement_does_not_remutate_the_catalog() {
    let app = spawn_app().await;
    write_catalog_file(&app, "resistors/resistors.csv", RESISTORS);
    let cookie = login_admin(&app).await;

    create_two_changes(&app, &cookie).await;
    let (_, body) = post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0001/changes/create-eco",
        serde_json::json!({ "title": "E1" }),
    )
    .await;
    let eco_id = body["data"]["id"].as_str().unwrap().to_string();
    post(&app, &cookie, &format!("/api/v1/ecos/{}/submit", eco_id), serde_json::json!({})).await;
    post(&app, &cookie, &format!("/api/v1/ecos/{}/approve", eco_id), serde_json::json!({})).await;
    let (status, _) = post(&app, &cookie, &format!("/api/v1/ecos/{}/implement", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);

    // A second implement is an invalid transition, not a re-application.
    let (status, _) = post(&app, &cookie, &format!("/api/v1/ecos/{}/implement", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ipn_rename_cascades_into_boms() {
    let app = spawn_app().await;
    write_catalog_file(&app, "resistors/resistors.csv", RESISTORS);
    write_catalog_file(
        &app,
        "assemblies/PCA-100.csv",
        "IPN,Qty\nRES-0001,4\nCAP-0001,1\n",
    );
    let cookie = login_admin(&app).await;

    let (status, _) = post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0001/changes",
        serde_json::json!({ "field_name": "IPN", "new_value": "RES-9000" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0001/changes/create-eco",
        serde_json::json!({ "title": "rename" }),
    )
    .await;
    let eco_id = body["data"]["id"].as_str().unwrap().to_string();
    post(&app, &cookie, &format!("/api/v1/ecos/{}/submit", eco_id), serde_json::json!({})).await;
    post(&app, &cookie, &format!("/api/v1/ecos/{}/approve", eco_id), serde_json::json!({})).await;
    let (status, body) = post(&app, &cookie, &format!("/api/v1/ecos/{}/implement", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["summary"]["errors"].as_array().unwrap().is_empty());

    // The part row carries the new IPN and the BOM followed.
    assert!(app.state.catalog.find_part("RES-9000").unwrap().is_some());
    let bom_file = app
        .state
        .catalog
        .csv_files()
        .unwrap()
        .into_iter()
        .find(|p| p.to_string_lossy().contains("PCA-100"))
        .unwrap();
    let loaded = app.state.catalog.load(&bom_file).unwrap();
    let col = loaded.ipn_column().unwrap();
    assert!(loaded.records.iter().any(|r| r.get(col) == Some("RES-9000")));
    assert!(!loaded.records.iter().any(|r| r.get(col) == Some("RES-0001")));
}

#[tokio::test]
async fn test_implement_is_gated_on_approve_permission() {
    let app = spawn_app().await;
    write_catalog_file(&app, "resistors/resistors.csv", RESISTORS);
    create_user(&app, "jdoe", "a-decent-password", "user").await;
    let admin_cookie = login_admin(&app).await;
    let user_cookie = login(&app, "jdoe", "a-decent-password").await;

    create_two_changes(&app, &admin_cookie).await;
    let (_, body) = post(
        &app,
        &admin_cookie,
        "/api/v1/parts/RES-0001/changes/create-eco",
        serde_json::json!({ "title": "E1" }),
    )
    .await;
    let eco_id = body["data"]["id"].as_str().unwrap().to_string();
    post(&app, &admin_cookie, &format!("/api/v1/ecos/{}/submit", eco_id), serde_json::json!({})).await;

    // The `user` role has no `approve` grant on ecos.
    let (status, body) = post(&app, &user_cookie, &format!("/api/v1/ecos/{}/approve", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = post(&app, &admin_cookie, &format!("/api/v1/ecos/{}/approve", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, &user_cookie, &format!("/api/v1/ecos/{}/implement", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_parallel_implementations_on_disjoint_parts() {
    let app = spawn_app().await;
    write_catalog_file(&app, "resistors/resistors.csv", RESISTORS);
    write_catalog_file(&app, "caps/caps.csv", "IPN,Description\nCAP-0001,Old cap\n");
    let cookie = login_admin(&app).await;

    let mut eco_ids = Vec::new();
    for (ipn, field, value) in [("RES-0001", "Description", "New"), ("CAP-0001", "Description", "New cap")] {
        post(
            &app,
            &cookie,
            &format!("/api/v1/parts/{}/changes", ipn),
            serde_json::json!({ "field_name": field, "new_value": value }),
        )
        .await;
        let (_, body) = post(
            &app,
            &cookie,
            &format!("/api/v1/parts/{}/changes/create-eco", ipn),
            serde_json::json!({ "title": format!("E-{}", ipn) }),
        )
        .await;
        let eco_id = body["data"]["id"].as_str().unwrap().to_string();
        post(&app, &cookie, &format!("/api/v1/ecos/{}/submit", eco_id), serde_json::json!({})).await;
        post(&app, &cookie, &format!("/api/v1/ecos/{}/approve", eco_id), serde_json::json!({})).await;
        eco_ids.push(eco_id);
    }

    // Fire both implementations concurrently; the engine serializes them
    // internally and both must land.
    let mut tasks = Vec::new();
    for eco_id in &eco_ids {
        let ecos = app.state.ecos.clone();
        let eco_id = eco_id.clone();
        tasks.push(tokio::spawn(async move {
            ecos.implement(&eco_id, &zrp::application::services::AuditActor::system()).await
        }));
    }
    for task in tasks {
        let (eco, summary) = task.await.unwrap().unwrap();
        assert_eq!(eco.status, zrp_domain::entities::EcoStatus::Implemented);
        assert_eq!(summary.rejected.len(), 0);
    }

    let res = app.state.catalog.find_part("RES-0001").unwrap().unwrap();
    assert_eq!(res.file.row_as_map(res.row)["Description"], "New");
    let cap = app.state.catalog.find_part("CAP-0001").unwrap().unwrap();
    assert_eq!(cap.file.row_as_map(cap.row)["Description"], "New cap");
}

#[tokio::test]
async fn test_missing_part_group_is_rejected_without_blocking_others() {
    let app = spawn_app().await;
    write_catalog_file(&app, "resistors/resistors.csv", RESISTORS);
    let cookie = login_admin(&app).await;

    // One good change plus one change whose part row vanishes before
    // implementation.
    post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0001/changes",
        serde_json::json!({ "field_name": "Description", "new_value": "New" }),
    )
    .await;
    post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0002/changes",
        serde_json::json!({ "field_name": "Description", "new_value": "Gone" }),
    )
    .await;

    // Both parts share an ECO: batch the second part's draft in manually.
    let (_, body) = post(
        &app,
        &cookie,
        "/api/v1/parts/RES-0001/changes/create-eco",
        serde_json::json!({ "title": "mixed" }),
    )
    .await;
    let eco_id = body["data"]["id"].as_str().unwrap().to_string();
    let drafts = app.state.change_repo.drafts_for_part("RES-0002").await.unwrap();
    let draft_ids: Vec<i64> = drafts.iter().map(|c| c.id).collect();
    app.state.change_repo.adopt_into_eco(&draft_ids, &eco_id).await.unwrap();

    post(&app, &cookie, &format!("/api/v1/ecos/{}/submit", eco_id), serde_json::json!({})).await;
    post(&app, &cookie, &format!("/api/v1/ecos/{}/approve", eco_id), serde_json::json!({})).await;

    // Remove RES-0002 from the catalog before implementation.
    write_catalog_file(&app, "resistors/resistors.csv", "IPN,Description,Cost\nRES-0001,Old,10.50\n");

    let (status, body) = post(&app, &cookie, &format!("/api/v1/ecos/{}/implement", eco_id), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK, "partial failure still implements");
    assert_eq!(body["data"]["summary"]["applied"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["summary"]["rejected"].as_array().unwrap().len(), 1);
    assert!(!body["data"]["summary"]["errors"].as_array().unwrap().is_empty());

    let location = app.state.catalog.find_part("RES-0001").unwrap().unwrap();
    assert_eq!(location.file.row_as_map(location.row)["Description"], "New");
}
