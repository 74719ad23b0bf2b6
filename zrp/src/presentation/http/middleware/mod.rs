// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Middleware pipeline, outermost first: security headers → rate limit →
//! CORS/trace → authenticate → authorize → handler.

pub mod auth;
pub mod client_ip;
pub mod rate_limit;
pub mod rbac;
pub mod security_headers;
