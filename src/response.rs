// src/response.rs

use axum::Json;
use serde::Serialize;

/// Uniform success envelope shared by all routes.
/// The failure half of the envelope is produced by `AppError`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}
