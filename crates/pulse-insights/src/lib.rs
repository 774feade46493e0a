//! Narrative-summary boundary for the SocialPulse report engine.
//!
//! Builds a fixed-shape analyst prompt from an aggregation result and calls
//! an external text-generation service. The numeric pipeline never depends
//! on this layer: every failure mode degrades to a fixed fallback string
//! and is never retried.

pub mod client;
pub mod prompt;

pub use client::InsightsClient;
pub use prompt::build_insights_prompt;
