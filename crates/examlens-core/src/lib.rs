//! examlens-core — learner performance analytics engine.
//!
//! Turns a history of completed exam attempts into accuracy, trend and
//! knowledge-gap metrics, forecasts and study recommendations. The engine
//! modules (`metrics`, `trends`, `gaps`) are pure functions with no I/O;
//! `parser` and `report` handle loading and persistence around them.

pub mod error;
pub mod gaps;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;
pub mod trends;
