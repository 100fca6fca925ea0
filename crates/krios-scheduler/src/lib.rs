//! Scheduling logic for LEO edge workloads: zone membership, successor
//! scoring, departure prediction, initial placement, and handover.

pub mod config;
pub mod constants;
pub mod controller;
pub mod departure;
pub mod error;
pub mod filter;
pub mod lead_margin;
pub mod placement;
pub mod scorer;

pub use error::{Result, SchedulerError};
