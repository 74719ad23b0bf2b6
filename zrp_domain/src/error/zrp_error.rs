// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! Hierarchical error type for the ZRP domain. Every fallible operation in
//! the workspace returns `Result<T, ZrpError>`; the presentation layer maps
//! each variant onto an HTTP status and a symbolic wire code, so the mapping
//! lives here, next to the variants, rather than being scattered across
//! handlers.
//!
//! ## Error Categories
//!
//! - **Caller errors**: `BadRequest`, `NotFound`, `Conflict`,
//!   `InvalidTransition` — the request was understood but cannot be honored.
//! - **Admission errors**: `Unauthorized`, `Forbidden`, `RateLimited` —
//!   rejected before any handler logic runs.
//! - **Store errors**: `ConstraintViolation`, `DatabaseError` — surfaced by
//!   the relational store; CHECK/UNIQUE failures caused by user input are
//!   reported as caller errors, everything else as internal.
//! - **System errors**: `IoError`, `SerializationError`, `Internal`,
//!   `Unavailable` — unrecovered infrastructure failures. Messages for these
//!   are kept non-revealing on the wire.
//!
//! ## Wire Contract
//!
//! Errors serialize as `{"error": "<message>", "code": "<SYMBOL>"}` with the
//! status from [`ZrpError::http_status`]. The symbols are part of the public
//! API and must stay stable.

use thiserror::Error;

/// Domain-specific errors for the ZRP PLM system.
///
/// Each variant carries a human-readable message. Variants map 1:1 onto the
/// wire-level `(status, code)` pairs; see [`ZrpError::http_status`] and
/// [`ZrpError::code`].
#[derive(Error, Debug, Clone)]
pub enum ZrpError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("rate limit exceeded")]
    RateLimited,

    /// CHECK/FK violation from the store. `user_caused` selects 400 vs 500.
    #[error("{message}")]
    ConstraintViolation { message: String, user_caused: bool },

    /// Attempted status transition the state machine does not allow.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ZrpError {
    /// Creates a new bad-request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Creates a new unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Creates a new forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Creates a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a new conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Creates a constraint violation attributable to user input (400)
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: msg.into(),
            user_caused: true,
        }
    }

    /// Creates an internal constraint violation (500)
    pub fn constraint_internal(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: msg.into(),
            user_caused: false,
        }
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Creates a new database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    /// Creates a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Symbolic wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) | Self::InvalidTransition(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited => "RATE_LIMIT_EXCEEDED",
            Self::ConstraintViolation { .. } => "CONSTRAINT_VIOLATION",
            Self::DatabaseError(_) | Self::IoError(_) | Self::SerializationError(_) | Self::Internal(_) => "INTERNAL",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// HTTP status this error transports as.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) | Self::InvalidTransition(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::RateLimited => 429,
            Self::ConstraintViolation { user_caused, .. } => {
                if *user_caused {
                    400
                } else {
                    500
                }
            }
            Self::DatabaseError(_) | Self::IoError(_) | Self::SerializationError(_) | Self::Internal(_) => 500,
            Self::Unavailable(_) => 503,
        }
    }

    /// Whether the wire message should be replaced by a generic one.
    ///
    /// Store and I/O failures may embed paths or SQL fragments; those stay in
    /// the server log only.
    pub fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::IoError(_) | Self::SerializationError(_) | Self::Internal(_)
        )
    }
}

impl From<std::io::Error> for ZrpError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for ZrpError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError(error.to_string())
    }
}
