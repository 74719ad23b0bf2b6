// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Wire Error Mapping and Response Envelope
//!
//! Success responses use the `{"data": …}` envelope; errors use
//! `{"error": "<message>", "code": "<SYMBOL>"}` with the status from the
//! domain error. Store/I-O failures keep their detail in the server log and
//! go out as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use zrp_domain::ZrpError;

/// Handler result alias.
pub type ApiResult<T = Json<serde_json::Value>> = Result<T, ApiError>;

/// Newtype so the foreign `IntoResponse` trait can be implemented for the
/// domain error.
#[derive(Debug)]
pub struct ApiError(pub ZrpError);

impl From<ZrpError> for ApiError {
    fn from(err: ZrpError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if self.0.is_sensitive() {
            error!(error = %self.0, "internal error");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        let body = Json(serde_json::json!({ "error": message, "code": self.0.code() }));
        (status, body).into_response()
    }
}

/// Wraps a payload in the success envelope.
pub fn data(payload: impl Serialize) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "data": payload }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            ApiError(ZrpError::not_found("x")).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(ZrpError::RateLimited).into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError(ZrpError::database("secret detail")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
