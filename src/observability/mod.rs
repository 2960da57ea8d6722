//! Observability for the query engine and moderation service
//!
//! Structured JSON logs only: one line per event, deterministic key order.
//!
//! ```ignore
//! use gbads_engine::observability::{Logger, ObservationScope};
//!
//! Logger::info("CATALOG_LOADED", &[("tables", "42")]);
//!
//! let scope = ObservationScope::with_fields("QUERY", &[("table", "biomass_oie")]);
//! // ... do work ...
//! scope.complete();
//! ```

mod logger;
mod scope;

pub use logger::{Logger, Severity};
pub use scope::{ObservationScope, Timer};
