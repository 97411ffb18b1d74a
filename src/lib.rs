//! Monthly housing panel: harmonizes transaction prices, weekly mortgage
//! rates and search-interest scores into one aligned monthly table.
//!
//! ```text
//!  rows ──normalizer──▶ RawObservation ──aggregator──▶ MonthlySeries ×3
//!                                                          │
//!                                                        merger
//!                                                          ▼
//!                     PanelRecord ◀──serializer── Panel ◀──analyzer::derived
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod merger;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod serializer;
pub mod source;
pub mod storage;
pub mod utils;
