//! # GBADs HTTP Server Module
//!
//! Axum application exposing the query engine and the comment moderation
//! workflow.
//!
//! # Endpoints
//!
//! - `/`, `/health` - Welcome and health check
//! - `/GBADsTables/public` - Table listing
//! - `/GBADsTable/public` - Table description
//! - `/GBADsPublicQuery/:table_name` - Filtered, joined, ordered query
//! - `/GBADsLivestockPopulation/:data_source` - Population shortcut
//! - `/slack/*` - Comment moderation (when configured)

pub mod config;
pub mod engine_routes;
pub mod errors;
pub mod moderation_routes;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::HttpServer;
