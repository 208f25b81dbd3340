//! Error conversion helpers
//!
//! Attach a path to errors from file reads and parsers.

use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting foreign errors to `ApplicationResult` with context.
pub trait ResultExt<T> {
    /// Wrap the error as `OperationFailed` naming the action and the path.
    ///
    /// # Example
    /// ```ignore
    /// let content = std::fs::read_to_string(&path)
    ///     .with_path_context("read scene", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}
