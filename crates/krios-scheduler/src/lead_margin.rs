//! Lead margin (§4.8): how far ahead of the predicted departure instant the
//! handover should actually fire.

use krios_geometry::CartesianKm;

use crate::constants::{LEAD_MARGIN_FIXED_SECS, LEAD_MARGIN_SLACK_DAYS};

/// Default ground-to-satellite RTT oracle: doubles the speed-of-light
/// one-way delay over `distance_km` for a round trip. The core only depends
/// on this through the `rtt_ms` parameter of [`lead_margin_secs`]; a
/// deployment can inject a different oracle (queue delay, measured link
/// latency) without touching the margin formula.
pub fn default_rtt_ms(distance_km: f64) -> f64 {
    const SPEED_OF_LIGHT_KM_PER_S: f64 = 299_792.458;
    2.0 * distance_km / SPEED_OF_LIGHT_KM_PER_S * 1000.0
}

/// Instantaneous Cartesian distance between the ground station and the
/// current node, the input to the RTT oracle. The ground station anchor
/// uses `GROUND_LINK_ALTITUDE_M` (550000 m) rather than the configured
/// elevation — the same shape of unit quirk as [`krios_geometry::zone_anchor`].
pub fn ground_to_node_distance_km(ground_station_pos: CartesianKm, node_pos: CartesianKm) -> f64 {
    krios_geometry::distance(ground_station_pos, node_pos)
}

/// Seconds of lead time to subtract from the predicted departure instant
/// before firing a handover. With lookahead disabled this is always zero:
/// the controller waits until the node has actually left the zone.
pub fn lead_margin_secs(lookahead: bool, rtt_ms: f64) -> f64 {
    if !lookahead {
        return 0.0;
    }

    LEAD_MARGIN_FIXED_SECS + 0.001 * rtt_ms + LEAD_MARGIN_SLACK_DAYS * 86400.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_lookahead_is_always_zero() {
        assert_eq!(lead_margin_secs(false, 1234.0), 0.0);
    }

    #[test]
    fn lookahead_margin_exceeds_fixed_component() {
        let margin = lead_margin_secs(true, default_rtt_ms(3000.0));
        assert!(margin > LEAD_MARGIN_FIXED_SECS);
    }

    #[test]
    fn slack_term_is_negligible() {
        // Documented as carried over for parity, not usefulness (§9.3/§11.3):
        // its contribution should be on the order of microseconds.
        assert!(LEAD_MARGIN_SLACK_DAYS * 86400.0 < 0.001);
    }

    #[test]
    fn rtt_grows_with_distance() {
        assert!(default_rtt_ms(2000.0) > default_rtt_ms(1000.0));
    }
}
