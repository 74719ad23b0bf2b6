// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Per-IP, Per-Class Rate Limiter
//!
//! Fixed 60-second windows keyed `(client-IP, class)`:
//!
//! - `login` — `/auth/login` only
//! - `api` — everything under `/api/v1/`
//! - other paths are unlimited
//!
//! Every limited response carries `X-RateLimit-Limit`, `X-RateLimit-Remaining`
//! and `X-RateLimit-Reset` (unix seconds of window end); a rejection adds
//! `Retry-After` and the standard 429 error body. Distinct classes keep
//! independent buckets for the same IP, and entries older than two windows
//! are swept opportunistically so the table cannot grow without bound.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parking_lot::Mutex;
use tracing::warn;

use super::client_ip::client_ip;
use crate::presentation::http::state::AppState;

/// Window length in seconds.
const WINDOW_SECS: u64 = 60;

/// Sweep the table once it holds this many buckets.
const SWEEP_THRESHOLD: usize = 1024;

/// Endpoint class with its own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitClass {
    Login,
    Api,
}

impl LimitClass {
    /// Classifies a request path; `None` means unlimited.
    pub fn classify(path: &str) -> Option<LimitClass> {
        if path == "/auth/login" {
            Some(LimitClass::Login)
        } else if path.starts_with("/api/v1/") {
            Some(LimitClass::Api)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    window_start: u64,
}

/// Admission decision plus everything needed for the headers.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_unix: u64,
    pub retry_after: u64,
}

pub struct RateLimiter {
    login_limit: u32,
    api_limit: u32,
    windows: Mutex<HashMap<(String, LimitClass), Window>>,
}

impl RateLimiter {
    pub fn new(login_limit: u32, api_limit: u32) -> Self {
        Self {
            login_limit,
            api_limit,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn limit_for(&self, class: LimitClass) -> u32 {
        match class {
            LimitClass::Login => self.login_limit,
            LimitClass::Api => self.api_limit,
        }
    }

    /// Counts one request at `now_unix` and decides admission.
    pub fn check(&self, ip: &str, class: LimitClass, now_unix: u64) -> Decision {
        let limit = self.limit_for(class);
        let window_start = now_unix - now_unix % WINDOW_SECS;
        let reset_unix = window_start + WINDOW_SECS;

        let mut windows = self.windows.lock();
        if windows.len() > SWEEP_THRESHOLD {
            let horizon = window_start.saturating_sub(2 * WINDOW_SECS);
            windows.retain(|_, w| w.window_start >= horizon);
        }

        let window = windows.entry((ip.to_string(), class)).or_insert(Window {
            count: 0,
            window_start,
        });
        if window.window_start != window_start {
            window.count = 0;
            window.window_start = window_start;
        }
        window.count += 1;

        Decision {
            allowed: window.count <= limit,
            limit,
            remaining: limit.saturating_sub(window.count),
            reset_unix,
            retry_after: (reset_unix - now_unix).clamp(1, WINDOW_SECS),
        }
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn apply_headers(response: &mut Response, decision: &Decision) {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", header_number(decision.limit as u64));
    headers.insert("x-ratelimit-remaining", header_number(decision.remaining as u64));
    headers.insert("x-ratelimit-reset", header_number(decision.reset_unix));
}

fn header_number(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

/// The admission middleware.
pub async fn rate_limit(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let Some(class) = LimitClass::classify(request.uri().path()) else {
        return next.run(request).await;
    };

    let ip = client_ip(&request);
    let decision = state.rate_limiter.check(&ip, class, now_unix());

    if !decision.allowed {
        warn!(ip = %ip, path = request.uri().path(), "rate limit exceeded");
        let body = Json(serde_json::json!({
            "error": "rate limit exceeded",
            "code": "RATE_LIMIT_EXCEEDED",
        }));
        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
        apply_headers(&mut response, &decision);
        response
            .headers_mut()
            .insert("retry-after", header_number(decision.retry_after));
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(&mut response, &decision);
    response
}
