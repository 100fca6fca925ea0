//! Startup configuration for the placement decider and handover controller
//! binaries, parsed with `clap`'s derive API.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Successor selection policy (§4.4). `Krios` is the default: it favors the
/// node that will remain in zone longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum SuccessorMode {
    #[default]
    Krios,
    Closest,
    Random,
}

/// Fixed ground-station location used for the lead-margin RTT estimate.
#[derive(Debug, Clone, Copy)]
pub struct GroundStation {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub elevation_m: f64,
}

impl Default for GroundStation {
    /// Oregon.
    fn default() -> Self {
        Self {
            lat_deg: 38.875,
            lon_deg: -121.707056,
            elevation_m: 0.0,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "krios-scheduler", about = "Initial placement decider for LEO edge workloads")]
pub struct SchedulerArgs {
    /// Path to the TLE catalog file.
    #[arg(long, default_value = "tles.txt")]
    pub tles: PathBuf,

    /// Cluster namespace to watch for pending workloads.
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Verbose (debug-level) logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(name = "krios-controller", about = "Handover controller for LEO edge workloads")]
pub struct ControllerArgs {
    /// Path to the TLE catalog file.
    #[arg(long, default_value = "tles.txt")]
    pub tles: PathBuf,

    /// Cluster namespace to watch for running workloads.
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Successor selection policy.
    #[arg(long, value_enum, default_value_t = SuccessorMode::Krios)]
    pub successor_mode: SuccessorMode,

    /// Disable the lookahead lead margin (handover fires exactly at the
    /// predicted departure instant instead of ahead of it).
    #[arg(long)]
    pub no_lookahead: bool,

    /// Ground station latitude (degrees).
    #[arg(long, default_value_t = GroundStation::default().lat_deg)]
    pub ground_lat: f64,

    /// Ground station longitude (degrees).
    #[arg(long, default_value_t = GroundStation::default().lon_deg)]
    pub ground_lon: f64,

    /// Ground station elevation (meters).
    #[arg(long, default_value_t = GroundStation::default().elevation_m)]
    pub ground_elevation_m: f64,

    /// Verbose (debug-level) logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ControllerArgs {
    pub fn ground_station(&self) -> GroundStation {
        GroundStation {
            lat_deg: self.ground_lat,
            lon_deg: self.ground_lon,
            elevation_m: self.ground_elevation_m,
        }
    }

    pub fn lookahead(&self) -> bool {
        !self.no_lookahead
    }
}
