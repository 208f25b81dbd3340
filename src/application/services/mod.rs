//! Application services

pub mod walkthrough;

pub use walkthrough::{Walkthrough, WalkthroughService};
