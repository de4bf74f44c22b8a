use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{ExchangeData, ExchangeResponse};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rust-redis-health API",
        version = "0.1.0",
        description = "Liveness and round-trip checks against a Redis store"
    ),
    paths(
        handlers::health::health_handler,
        handlers::exchange::exchange_handler
    ),
    components(
        schemas(
            ExchangeResponse,
            ExchangeData,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "store", description = "Store round-trip operations")
    )
)]
pub struct ApiDoc;
