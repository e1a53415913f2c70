// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::json;

use classcards_core::error::ErrorKind;
use classcards_core::error::ErrorReport;

/// Wrapper so `ErrorReport` converts into the `{error: <message>}` JSON body
/// at the handler boundary. The status comes from the error's kind.
#[derive(Debug)]
pub struct ApiError(ErrorReport);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<ErrorReport> for ApiError {
    fn from(value: ErrorReport) -> Self {
        ApiError(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classcards_core::error::not_found;

    #[test]
    fn test_status_mapping() {
        let err: ApiError = not_found::<()>("Class not found").unwrap_err().into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
