#![forbid(unsafe_code)]

//! Core domain model and analytics for Lunacal.
//!
//! This crate provides:
//! - Domain types (cycles, symptoms, statistics, predictions, phase tags)
//! - Interval arithmetic on calendar days
//! - Cycle statistics and next-cycle prediction
//! - Symptom association
//! - Calendar phase classification
//! - An append-only record store and CSV export for the CLI
//!
//! The analytics modules are pure functions over caller-owned record
//! slices; only `store`, `export` and `config` perform I/O.

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod interval;
pub mod stats;
pub mod prediction;
pub mod symptoms;
pub mod calendar;
pub mod insights;
pub mod store;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{AnalyticsConfig, Config};
pub use stats::{compute_statistics, most_recent_cycle};
pub use prediction::{predict, predict_next_cycle};
pub use symptoms::{associate_symptom, link_symptom};
pub use calendar::{classify_day, MonthGrid, PhaseClassifier};
pub use insights::InsightReport;
pub use store::RecordStore;
