//! Management API client for swarmtail
//!
//! This crate provides the read-only stack/service directory used to
//! populate log stream filters.

mod client;
mod error;

pub use client::{ApiClient, Directory};
pub use error::{ApiError, ApiResult};

// Re-export types that are used in our public API
pub use swarmtail_types::{ServiceInfo, StackInfo};
