// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! HTTP handlers, one module per API family.

pub mod api_keys;
pub mod audit;
pub mod auth;
pub mod bulk;
pub mod ecos;
pub mod inventory;
pub mod parts;
pub mod permissions;
pub mod users;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::application::services::{AuditActor, Principal};

use super::middleware::client_ip::{client_ip_from, user_agent};

/// Extractor building the audit actor from the request surface: principal
/// (if authenticated), client IP through proxies, user agent.
pub struct Actor(pub AuditActor);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts.extensions.get::<Principal>();
        Ok(Actor(AuditActor {
            user_id: principal.and_then(|p| p.user_id),
            username: principal.map(|p| p.username.clone()).unwrap_or_default(),
            ip: client_ip_from(&parts.headers, &parts.extensions),
            user_agent: user_agent(&parts.headers),
        }))
    }
}
