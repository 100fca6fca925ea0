//! Global constants shared by every component (§3).

/// Constellation operating altitude (km).
pub const ALTITUDE_KM: f64 = 550.0;

/// Minimum elevation angle above the horizon a follower node must maintain
/// across the whole zone disk to be considered in zone.
pub const ELEVATION_ANGLE_DEG: f64 = 25.0;

pub fn elevation_angle_rad() -> f64 {
    ELEVATION_ANGLE_DEG.to_radians()
}

/// Forward-probe stride for the departure search (§4.5).
pub const DEPARTURE_PROBE_STRIDE_SECS: i64 = 100;

/// Bisection resolution for the departure search (§4.5).
pub const DEPARTURE_BISECTION_RESOLUTION_SECS: i64 = 1;

/// Safety ceiling used only if bisection is entered without ever completing
/// a successful forward probe (§4.5, §9.4).
pub const DEPARTURE_SAFETY_CEILING_SECS: i64 = 1000;

/// Fixed orchestration overhead folded into the lookahead lead margin (§4.8).
pub const LEAD_MARGIN_FIXED_SECS: f64 = 5.0;

/// Synchronization slack term, expressed in days (§9.3, §11.3). Its effect on
/// the margin is on the order of microseconds; kept for parity rather than
/// because it does useful work.
pub const LEAD_MARGIN_SLACK_DAYS: f64 = 3000.0 / 7575.0 / 86400.0;

/// Ground-to-satellite altitude (meters) used for the RTT distance estimate
/// (§4.8) — distinct from [`ALTITUDE_KM`] only in that it is passed directly
/// in meters rather than kilometers.
pub const GROUND_LINK_ALTITUDE_M: f64 = 550_000.0;
