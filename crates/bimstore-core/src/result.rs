//! Convenience result type alias for BIM Store.

use crate::error::AppError;

/// A specialized `Result` type for BIM Store operations.
pub type AppResult<T> = Result<T, AppError>;
