//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`media`] - Media link resolution per platform
//! - [`system`] - Banner, health, OpenAPI

use serde::{Deserialize, Serialize};

mod media;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use media::*;
pub use system::*;

/// Query parameters for GET /api/:platform
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct MediaQuery {
    /// Post URL to resolve; blank counts as missing
    pub url: Option<String>,
}
