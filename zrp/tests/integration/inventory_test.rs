// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Inventory transaction engine: signed deltas, the store-enforced
//! non-negativity invariant, journal atomicity, and the concurrency
//! contract.

use axum::http::{Method, StatusCode};

use zrp::application::services::{AuditActor, TransactRequest};
use zrp_domain::entities::TransactionType;

use crate::common::*;

fn receive(ipn: &str, qty: f64) -> TransactRequest {
    TransactRequest {
        ipn: ipn.to_string(),
        tx_type: TransactionType::Receive,
        qty,
        reference: None,
        notes: None,
        destination: None,
    }
}

fn movement(ipn: &str, tx_type: TransactionType, qty: f64) -> TransactRequest {
    TransactRequest {
        ipn: ipn.to_string(),
        tx_type,
        qty,
        reference: None,
        notes: None,
        destination: None,
    }
}

#[tokio::test]
async fn test_receive_issue_adjust_sequence() {
    let app = spawn_app().await;
    let actor = AuditActor::system();

    let outcome = app.state.inventory.transact(receive("INV-1", 100.0), &actor).await.unwrap();
    assert_eq!(outcome.new_qty_on_hand, 100.0);

    let outcome = app
        .state
        .inventory
        .transact(movement("INV-1", TransactionType::Issue, 30.0), &actor)
        .await
        .unwrap();
    assert_eq!(outcome.new_qty_on_hand, 70.0);

    let outcome = app
        .state
        .inventory
        .transact(movement("INV-1", TransactionType::Adjust, 50.0), &actor)
        .await
        .unwrap();
    assert_eq!(outcome.new_qty_on_hand, 50.0);

    // The adjust journal row carries the signed delta, not the target.
    let journal = app.state.inventory_repo.list_transactions("INV-1", 10).await.unwrap();
    assert_eq!(journal.len(), 3);
    assert_eq!(journal[0].qty, -20.0);
    assert_eq!(journal[1].qty, -30.0);
    assert_eq!(journal[2].qty, 100.0);
}

#[tokio::test]
async fn test_overdraw_is_rejected_with_no_journal_row() {
    let app = spawn_app().await;
    let actor = AuditActor::system();

    app.state.inventory.transact(receive("INV-2", 5.0), &actor).await.unwrap();
    let err = app
        .state
        .inventory
        .transact(movement("INV-2", TransactionType::Issue, 10.0), &actor)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONSTRAINT_VIOLATION");
    assert_eq!(err.http_status(), 400);

    // Nothing moved and nothing was journaled.
    let item = app.state.inventory_repo.get("INV-2").await.unwrap().unwrap();
    assert_eq!(item.qty_on_hand, 5.0);
    assert_eq!(app.state.inventory_repo.count_transactions("INV-2").await.unwrap(), 1);
}

#[tokio::test]
async fn test_zero_qty_movement_journals_without_change() {
    let app = spawn_app().await;
    let actor = AuditActor::system();

    app.state.inventory.transact(receive("INV-3", 10.0), &actor).await.unwrap();
    let outcome = app.state.inventory.transact(receive("INV-3", 0.0), &actor).await.unwrap();
    assert_eq!(outcome.new_qty_on_hand, 10.0);
    assert_eq!(app.state.inventory_repo.count_transactions("INV-3").await.unwrap(), 2);
}

#[tokio::test]
async fn test_negative_qty_is_a_bad_request() {
    let app = spawn_app().await;
    let err = app
        .state
        .inventory
        .transact(receive("INV-4", -1.0), &AuditActor::system())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BAD_REQUEST");
}

#[tokio::test]
async fn test_transfer_writes_two_rows_and_moves_location() {
    let app = spawn_app().await;
    let actor = AuditActor::system();

    app.state.inventory.transact(receive("INV-5", 20.0), &actor).await.unwrap();
    let mut request = movement("INV-5", TransactionType::Transfer, 8.0);
    request.destination = Some("Shelf B-3".to_string());
    let outcome = app.state.inventory.transact(request, &actor).await.unwrap();
    assert_eq!(outcome.new_qty_on_hand, 20.0, "transfer is net zero");

    let journal = app.state.inventory_repo.list_transactions("INV-5", 10).await.unwrap();
    assert_eq!(journal.len(), 3);
    let transfer_rows: Vec<f64> = journal
        .iter()
        .filter(|t| t.tx_type == TransactionType::Transfer)
        .map(|t| t.qty)
        .collect();
    assert_eq!(transfer_rows.len(), 2);
    assert!(transfer_rows.contains(&8.0) && transfer_rows.contains(&-8.0));

    let item = app.state.inventory_repo.get("INV-5").await.unwrap().unwrap();
    assert_eq!(item.location, "Shelf B-3");
}

#[tokio::test]
async fn test_concurrent_movements_on_one_ipn_serialize() {
    let app = spawn_app().await;
    let actor = AuditActor::system();
    app.state.inventory.transact(receive("INV-RACE", 100.0), &actor).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let inventory = app.state.inventory.clone();
        tasks.push(tokio::spawn(async move {
            inventory
                .transact(receive("INV-RACE", 10.0), &AuditActor::system())
                .await
        }));
    }
    for _ in 0..5 {
        let inventory = app.state.inventory.clone();
        tasks.push(tokio::spawn(async move {
            inventory
                .transact(movement("INV-RACE", TransactionType::Issue, 4.0), &AuditActor::system())
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // 100 + 10*10 - 5*4 = 180, with exactly 16 journal rows (1 seed + 15).
    let item = app.state.inventory_repo.get("INV-RACE").await.unwrap().unwrap();
    assert_eq!(item.qty_on_hand, 180.0);
    assert!(item.qty_on_hand >= 0.0);
    assert_eq!(app.state.inventory_repo.count_transactions("INV-RACE").await.unwrap(), 16);
}

#[tokio::test]
async fn test_concurrent_movements_on_distinct_ipns_proceed() {
    let app = spawn_app().await;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let inventory = app.state.inventory.clone();
        tasks.push(tokio::spawn(async move {
            inventory
                .transact(receive(&format!("INV-PAR-{}", i), 7.0), &AuditActor::system())
                .await
        }));
    }
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.new_qty_on_hand, 7.0);
    }
}

#[tokio::test]
async fn test_transact_endpoint_and_bulk_update() {
    let app = spawn_app().await;
    let cookie = login_admin(&app).await;

    let (status, response) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/transact",
        &[("cookie", &cookie)],
        Some(serde_json::json!({ "ipn": "INV-HTTP", "type": "receive", "qty": 25.0, "reference": "PO-0001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["new_qty_on_hand"], 25.0);

    // Partial success: one good row, one invalid IPN.
    let (status, response) = send(
        &app,
        Method::POST,
        "/api/v1/inventory/bulk-update",
        &[("cookie", &cookie)],
        Some(serde_json::json!({ "items": [
            { "ipn": "INV-HTTP", "location": "A-1", "reorder_point": 10.0 },
            { "ipn": "bad ipn!", "location": "B-2" },
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["success"], 1);
    assert_eq!(body["data"]["failed"], 1);
    assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 1);

    let item = app.state.inventory_repo.get("INV-HTTP").await.unwrap().unwrap();
    assert_eq!(item.location, "A-1");
    assert_eq!(item.qty_on_hand, 25.0, "bulk update never touches quantities");
}
