use crate::error::{HealthResponse, UnhealthyResponse};
use crate::routes;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    Json,
};
use std::time::Instant;

/// Reported regardless of store health: the process itself is up.
pub const ALIVE: &str = "I'm Alive!";

type NoStore = [(HeaderName, &'static str); 1];

const NO_STORE: NoStore = [(header::CACHE_CONTROL, "no-store")];

/// GET /api/health handler - Health check endpoint
///
/// Pings the store within a one second deadline. Returns 200 OK if the store
/// answered in time, 500 Internal Server Error otherwise. Responses are never
/// cacheable so every call reflects live state.
#[utoipa::path(
    get,
    path = routes::HEALTH,
    responses(
        (status = 200, description = "Store is reachable", body = HealthResponse),
        (status = 500, description = "Store is unreachable or slow", body = UnhealthyResponse)
    ),
    tag = "health"
)]
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, NoStore, Json<HealthResponse>), (StatusCode, NoStore, Json<UnhealthyResponse>)>
{
    let started = Instant::now();

    match state.store.ping().await {
        Ok(latency) => {
            tracing::debug!("Health check passed, store latency {:?}", latency);
            Ok((
                StatusCode::OK,
                NO_STORE,
                Json(HealthResponse {
                    status: ALIVE.to_string(),
                    store: "Connected".to_string(),
                    response_time: elapsed_ms(started),
                }),
            ))
        }
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                NO_STORE,
                Json(UnhealthyResponse {
                    status: ALIVE.to_string(),
                    store: "Disconnected".to_string(),
                    error: e.to_string(),
                    response_time: elapsed_ms(started),
                }),
            ))
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
