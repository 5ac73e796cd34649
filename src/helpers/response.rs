use axum::response::Json;
use common::ApiResponse;

/// Wrap a successful result in the response envelope.
pub fn respond<T>(data: T, message: &str) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        data,
        message: message.to_string(),
        success: true,
    })
}
