// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Client-IP extraction through proxies.
//!
//! Preference order: first `X-Forwarded-For` value → `X-Real-IP` → peer
//! address. Values are stored raw (no parsing); the rate limiter and the
//! audit trail share this rule so the same client gets the same key in
//! both.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap, Request};

/// Extracts the client IP per the preference order above.
pub fn client_ip<B>(request: &Request<B>) -> String {
    client_ip_from(request.headers(), request.extensions())
}

/// Same rule, usable from extractors that only hold request parts.
pub fn client_ip_from(headers: &HeaderMap, extensions: &Extensions) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            if !value.trim().is_empty() {
                return value.trim().to_string();
            }
        }
    }
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The `User-Agent` header, or empty.
pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/parts");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_forwarded_for_takes_first_value() {
        let request = request_with(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
            ("x-real-ip", "10.9.9.9"),
        ]);
        assert_eq!(client_ip(&request), "203.0.113.9");
    }

    #[test]
    fn test_real_ip_is_second_choice() {
        let request = request_with(&[("x-real-ip", "10.9.9.9")]);
        assert_eq!(client_ip(&request), "10.9.9.9");
    }

    #[test]
    fn test_falls_back_when_nothing_present() {
        let request = request_with(&[]);
        assert_eq!(client_ip(&request), "unknown");
    }
}
