//! Domain core for the SocialPulse report engine.
//!
//! Holds the normalized record model, metric definitions with their
//! snapshot/flow combination tags, cell-value and platform-name
//! normalization, reporting-period parsing, error types, CLI settings and
//! number formatting shared by the ingestion and aggregation layers.

pub mod error;
pub mod formatting;
pub mod models;
pub mod period;
pub mod settings;
pub mod values;
