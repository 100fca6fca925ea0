//! Departure Predictor (§4.5): the instant a node leaves a workload's zone.
//!
//! Two-phase search: a forward probe at a coarse stride to bracket the
//! departure, then bisection within the bracket down to a fixed resolution.
//! If the probe never finds an out-of-zone sample before the safety ceiling,
//! the ceiling instant itself is returned (§9.4, §11.4) — this is a known
//! staleness limitation, not a bug, and is exercised directly by a test below.

use chrono::{DateTime, Duration, Utc};
use krios_ephemeris::SatelliteCatalog;
use krios_geometry::{allowable_distance, distance, zone_anchor};
use tracing::debug;

use crate::constants::{
    elevation_angle_rad, ALTITUDE_KM, DEPARTURE_BISECTION_RESOLUTION_SECS, DEPARTURE_PROBE_STRIDE_SECS,
    DEPARTURE_SAFETY_CEILING_SECS,
};
use crate::error::Result;

/// Whether `sat_id` is inside the zone centered on `(center_lat, center_lon)`
/// with radius `zone_radius_km`, at `instant`.
fn in_zone(
    catalog: &SatelliteCatalog,
    sat_id: i64,
    center_lat: f64,
    center_lon: f64,
    zone_radius_km: f64,
    instant: DateTime<Utc>,
) -> Result<bool> {
    let anchor = zone_anchor(center_lat, center_lon, ALTITUDE_KM);
    let allowable = allowable_distance(zone_radius_km, ALTITUDE_KM, elevation_angle_rad());
    let sample = catalog.propagate(sat_id, instant)?;
    Ok(distance(sample.position, anchor) < allowable)
}

/// Predict the instant `sat_id` departs the zone, starting the search at
/// `from`. `from` is assumed to be a moment the node is in zone; callers
/// that already know it is not should not call this.
pub fn predict_departure(
    catalog: &SatelliteCatalog,
    sat_id: i64,
    center_lat: f64,
    center_lon: f64,
    zone_radius_km: f64,
    from: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let ceiling = from + Duration::seconds(DEPARTURE_SAFETY_CEILING_SECS);

    let mut lower = from;
    let mut upper = ceiling;
    let mut bracketed = false;

    let mut probe = from;
    while probe < ceiling {
        probe += Duration::seconds(DEPARTURE_PROBE_STRIDE_SECS);
        let probe = probe.min(ceiling);

        if !in_zone(catalog, sat_id, center_lat, center_lon, zone_radius_km, probe)? {
            lower = probe - Duration::seconds(DEPARTURE_PROBE_STRIDE_SECS);
            upper = probe;
            bracketed = true;
            break;
        }

        if probe >= ceiling {
            break;
        }
    }

    if !bracketed {
        debug!(sat_id, "departure search exhausted probe range without leaving zone; returning ceiling");
        return Ok(ceiling);
    }

    let resolution = Duration::seconds(DEPARTURE_BISECTION_RESOLUTION_SECS);
    while (upper - lower) > resolution {
        let mid = lower + (upper - lower) / 2;
        if in_zone(catalog, sat_id, center_lat, center_lon, zone_radius_km, mid)? {
            lower = mid;
        } else {
            upper = mid;
        }
    }

    Ok(lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE_TLE_LINE1: &str = "1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9994";
    const SAMPLE_TLE_LINE2: &str = "2 25544  51.6423 253.5360 0008413  91.3342 330.0527 15.50061756 23456";

    fn catalog() -> SatelliteCatalog {
        SatelliteCatalog::from_entries(vec![(
            25544,
            krios_ephemeris::TleEntry {
                line1: SAMPLE_TLE_LINE1.to_string(),
                line2: SAMPLE_TLE_LINE2.to_string(),
            },
        )])
    }

    #[test]
    fn returns_ceiling_when_never_leaves() {
        let catalog = catalog();
        // A zone radius large enough to contain the whole orbital shell
        // never excludes the node; the search should degrade to the ceiling
        // rather than loop or panic (§9.4 staleness behavior).
        let from = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let result = predict_departure(&catalog, 25544, 0.0, 0.0, 1_000_000.0, from).unwrap();
        let ceiling = from + Duration::seconds(DEPARTURE_SAFETY_CEILING_SECS);
        assert_eq!(result, ceiling);
    }

    #[test]
    fn departure_instant_is_after_start_and_within_ceiling() {
        let catalog = catalog();
        let from = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        // A small zone around an arbitrary point: the node is almost
        // certainly not inside it, so the very first probe already finds it
        // out of zone and the bracket collapses to [from, from+stride].
        let result = predict_departure(&catalog, 25544, 10.0, 10.0, 50.0, from).unwrap();
        assert!(result >= from);
        assert!(result <= from + Duration::seconds(DEPARTURE_SAFETY_CEILING_SECS));
    }
}
