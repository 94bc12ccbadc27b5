mod categories;
mod questions;
mod quizzes;

use axum::extract::{rejection::PathRejection, Path};
use serde::Serialize;

use super::error::ApiError;

pub use categories::category_router;
pub use questions::questions_router;
pub use quizzes::quizzes_router;

pub type ApiResponse<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct Success {
    success: bool,
}

impl Success {
    fn new() -> Self {
        Success { success: true }
    }
}

// ids that are not integers can never match a row
fn path_id(path: Result<Path<i64>, PathRejection>) -> ApiResponse<i64> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}
