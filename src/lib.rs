//! gbads-engine - Public query engine for the GBADs livestock data warehouse
//!
//! Translates loosely structured HTTP request parameters into a single
//! validated, parameterized SQL statement against an introspected schema
//! catalog, executes it once and renders the rows as JSON, HTML, text or CSV.

pub mod catalog;
pub mod cli;
pub mod http_server;
pub mod moderation;
pub mod observability;
pub mod query;
pub mod warehouse;
