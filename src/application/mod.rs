//! Application layer: scenes, storyboard and services
//!
//! This layer orchestrates domain logic and owns file access.

pub mod error;
pub mod error_ext;
pub mod scene;
pub mod services;
pub mod storyboard;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::ResultExt;
