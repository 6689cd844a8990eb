//! Public-safety insights engine.
//!
//! Aggregates crime reports, arrests and calls-for-service held in SQLite
//! into per-window snapshots: severity-weighted crime index, area and zip
//! rankings, trending offenses and key findings.

pub mod arrest_stats;
pub mod call_stats;
pub mod config;
pub mod crime_stats;
pub mod error;
pub mod findings;
pub mod insights_engine;
pub mod metrics;
pub mod multi_period;
pub mod records;
pub mod rng;
pub mod severity;
pub mod store;
pub mod synthetic;
pub mod types;
pub mod window;
