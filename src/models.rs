use serde::{Deserialize, Serialize};

/// Response type for a successful exchange
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExchangeResponse {
    pub success: bool,
    pub message: String,
    pub data: ExchangeData,
}

/// The key written and the values seen on either side of the round trip
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeData {
    pub key: String,
    pub set_value: String,
    pub retrieved_value: Option<String>,
}
