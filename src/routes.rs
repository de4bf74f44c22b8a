// Route path constants - single source of truth for all API paths

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::handlers::{exchange_handler, health_handler};
use crate::state::AppState;

pub const HEALTH: &str = "/api/health";
pub const EXCHANGE: &str = "/api/exchange";
/// Older name of the exchange route, still served.
pub const LEGACY_EXCHANGE: &str = "/api/redisexchange";
pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH, get(health_handler))
        .route(EXCHANGE, get(exchange_handler))
        .route(LEGACY_EXCHANGE, get(exchange_handler))
        .merge(SwaggerUi::new(SWAGGER_UI).url(OPENAPI_JSON, ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
