//! Geodetic/Cartesian conversions and zone-visibility geometry.
//!
//! This is the pure, stateless substrate shared by the placement decider and
//! the handover controller: converting a ground zone center into a Cartesian
//! anchor, measuring Cartesian distance, and converting a zone's radius and
//! the constellation's elevation-angle service requirement into an allowable
//! chord distance. Nothing here talks to the cluster or the ephemeris
//! catalog — those live in `krios-cluster` and `krios-ephemeris`.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used throughout this system (km).
pub const EARTH_RADIUS_KM: f64 = 6378.135;

/// A point in the Earth-Centered Cartesian frame, in kilometers.
///
/// Treated as compatible with the propagator's ECI output for distance
/// purposes (Earth rotation during a single decision window is neglected —
/// see the zone-center time-invariance note on [`zone_anchor`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianKm {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianKm {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn sub(self, other: CartesianKm) -> (f64, f64, f64) {
        (self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Dot product with a velocity vector given as raw components (km/s).
    pub fn dot(self, vx: f64, vy: f64, vz: f64) -> f64 {
        self.x * vx + self.y * vy + self.z * vz
    }
}

/// Convert a geodetic position to the Cartesian frame, for a spherical Earth
/// of radius [`EARTH_RADIUS_KM`].
///
/// `altitude_m` is in **meters** and is divided by 1000 internally. Some
/// call sites pass `altitude_km * 1000.0`, which looks like a needless
/// round-trip but has no effect on the resulting value and keeps every
/// caller working in the unit it already has on hand.
pub fn geodetic_to_cartesian(lat_deg: f64, lon_deg: f64, altitude_m: f64) -> CartesianKm {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let r = EARTH_RADIUS_KM + altitude_m / 1000.0;

    CartesianKm::new(
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    )
}

/// Euclidean distance between two Cartesian points, in kilometers.
pub fn distance(p: CartesianKm, q: CartesianKm) -> f64 {
    let (dx, dy, dz) = p.sub(q);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// The Cartesian anchor of a workload's zone: a point directly above the
/// zone center at the constellation's operating altitude.
///
/// Computed fresh by each caller and treated as time-invariant for the
/// duration of one decision — the zone does not rotate with the Earth on
/// the seconds-to-minutes scale of a single placement or departure search.
pub fn zone_anchor(center_lat_deg: f64, center_lon_deg: f64, altitude_km: f64) -> CartesianKm {
    geodetic_to_cartesian(center_lat_deg, center_lon_deg, altitude_km * 1000.0)
}

/// The maximum Cartesian chord distance between a satellite at `altitude_km`
/// and the zone anchor of a disk of radius `radius_km`, such that every
/// point in the disk still sees the satellite at or above `elevation_angle_rad`.
///
/// Derived from the standard satellite-coverage central angle (the earth
/// central angle at which a ground observer sees the satellite exactly at
/// the minimum elevation angle), shrunk by the zone's own angular radius so
/// that the *farthest* point in the disk — not just its center — keeps the
/// elevation constraint. A satellite whose distance to the zone anchor
/// exceeds this value is out of zone; the predicate is used identically by
/// the zone filter and inverted by the departure predictor, so this formula
/// must not vary between the two call sites.
pub fn allowable_distance(radius_km: f64, altitude_km: f64, elevation_angle_rad: f64) -> f64 {
    let shell_radius = EARTH_RADIUS_KM + altitude_km;

    // Earth central angle from the subsatellite point to the edge of
    // coverage at the requested minimum elevation angle.
    let coverage_angle =
        ((EARTH_RADIUS_KM / shell_radius) * elevation_angle_rad.cos()).acos() - elevation_angle_rad;

    let zone_angle = radius_km / EARTH_RADIUS_KM;
    let allowed_angle = (coverage_angle - zone_angle).max(0.0);

    2.0 * shell_radius * (allowed_angle / 2.0).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overhead_point_has_zero_distance_to_its_own_anchor() {
        let altitude_km = 550.0;
        let anchor = zone_anchor(38.875, -121.707, altitude_km);
        let sat = geodetic_to_cartesian(38.875, -121.707, altitude_km * 1000.0);
        assert!(distance(sat, anchor) < 1e-9);
    }

    #[test]
    fn allowable_distance_shrinks_as_zone_radius_grows() {
        let elevation = 25f64.to_radians();
        let d_small = allowable_distance(50.0, 550.0, elevation);
        let d_large = allowable_distance(500.0, 550.0, elevation);
        assert!(d_large < d_small);
    }

    #[test]
    fn allowable_distance_is_nonnegative_even_for_oversized_zones() {
        let elevation = 25f64.to_radians();
        let d = allowable_distance(100_000.0, 550.0, elevation);
        assert!(d >= 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let p = CartesianKm::new(1.0, 2.0, 3.0);
        let q = CartesianKm::new(4.0, -1.0, 2.0);
        assert!((distance(p, q) - distance(q, p)).abs() < 1e-12);
    }

    proptest::proptest! {
        #[test]
        fn allowable_distance_never_negative(
            radius_km in 0.0f64..20_000.0,
            altitude_km in 200.0f64..2000.0,
            elevation_deg in 0.0f64..89.0,
        ) {
            let d = allowable_distance(radius_km, altitude_km, elevation_deg.to_radians());
            proptest::prop_assert!(d >= 0.0);
        }

        #[test]
        fn geodetic_round_trip_distance_matches_anchor(
            lat in -90.0f64..90.0,
            lon in -180.0f64..180.0,
            altitude_km in 200.0f64..2000.0,
        ) {
            let anchor = zone_anchor(lat, lon, altitude_km);
            let sat = geodetic_to_cartesian(lat, lon, altitude_km * 1000.0);
            proptest::prop_assert!(distance(sat, anchor) < 1e-6);
        }
    }
}
