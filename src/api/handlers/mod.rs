//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Agent listing, health and statistics handlers.
pub mod agents;
/// Question processing through the orchestrator.
pub mod process;
/// Database schema rendering.
pub mod schema;
