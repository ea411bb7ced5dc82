//! moodreel-catalog — movie catalog client (TMDB-shaped REST API).
//!
//! Typed where the pipeline consumes the data (genre discovery), raw
//! passthrough where the daemon merely proxies (search, trending).

pub mod client;
pub mod models;

pub use client::{CatalogClient, CatalogError, DEFAULT_BASE_URL};
pub use models::MovieSummary;
