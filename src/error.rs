use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Error response type for the exchange endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    /// Milliseconds spent answering the request
    pub response_time: u64,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnhealthyResponse {
    pub status: String,
    pub store: String,
    pub error: String,
    pub response_time: u64,
}

/// Custom error type for API endpoints
///
/// Every store failure reaching a route is reported as a 500 with a JSON
/// body; none of them take the process down.
#[derive(Debug)]
pub enum ApiError {
    /// GET or SET against the store failed
    StoreOperation(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::StoreOperation(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        let body = Json(ErrorResponse {
            success: false,
            message: "Redis exchange failed".to_string(),
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StoreOperation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_error_maps_to_500() {
        let err = ApiError::from(StoreError::Operation {
            op: "SET",
            message: "Connection refused".to_string(),
        });

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Redis exchange failed");
        assert_eq!(json["error"], "Store SET failed: Connection refused");
    }

    #[test]
    fn test_health_response_field_names() {
        let json = serde_json::to_value(HealthResponse {
            status: "I'm Alive!".to_string(),
            store: "Connected".to_string(),
            response_time: 3,
        })
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({"status": "I'm Alive!", "store": "Connected", "responseTime": 3})
        );
    }
}
