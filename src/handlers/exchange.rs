use crate::error::{ApiError, ErrorResponse};
use crate::models::{ExchangeData, ExchangeResponse};
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

pub const TEST_KEY: &str = "test:key";
pub const TEST_VALUE: &str = "Hello Redis!";

/// GET /api/exchange handler - Write then read a fixed key
///
/// Every call overwrites `test:key`. Concurrent callers share that key with
/// no coordination, so a reader may observe another caller's write.
#[utoipa::path(
    get,
    path = routes::EXCHANGE,
    responses(
        (status = 200, description = "Round trip succeeded", body = ExchangeResponse),
        (status = 500, description = "Store error", body = ErrorResponse)
    ),
    tag = "store"
)]
pub async fn exchange_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ExchangeResponse>), ApiError> {
    state.store.set(TEST_KEY, TEST_VALUE).await?;
    let retrieved_value = state.store.get(TEST_KEY).await?;

    tracing::debug!("Exchange on {} returned {:?}", TEST_KEY, retrieved_value);

    Ok((
        StatusCode::OK,
        Json(ExchangeResponse {
            success: true,
            message: "Redis exchange successful".to_string(),
            data: ExchangeData {
                key: TEST_KEY.to_string(),
                set_value: TEST_VALUE.to_string(),
                retrieved_value,
            },
        }),
    ))
}
