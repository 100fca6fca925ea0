//! Successor Scorer (§4.4): rank zone-filtered candidates and pick one.

use chrono::{DateTime, Utc};
use krios_cluster::{Node, Workload};
use krios_ephemeris::SatelliteCatalog;
use krios_geometry::{distance, zone_anchor, CartesianKm};
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::config::SuccessorMode;
use crate::constants::ALTITUDE_KM;
use crate::error::Result;

#[derive(Clone)]
struct Scored {
    node: Node,
    dist_km: f64,
    krios_metric: f64,
}

/// Reduce already-scored candidates to one, per `mode`. Split out from
/// [`select_successor`] so the reduction itself — the part `krios` and
/// `closest` actually disagree on — is testable without a live ephemeris
/// catalog.
fn select_from_scored(scored: Vec<Scored>, mode: SuccessorMode) -> Option<Node> {
    let chosen = match mode {
        SuccessorMode::Krios => scored
            .into_iter()
            .max_by(|a, b| a.krios_metric.partial_cmp(&b.krios_metric).unwrap_or(std::cmp::Ordering::Equal)),
        SuccessorMode::Closest => scored
            .into_iter()
            .min_by(|a, b| a.dist_km.partial_cmp(&b.dist_km).unwrap_or(std::cmp::Ordering::Equal)),
        SuccessorMode::Random => unreachable!("handled by caller before scoring"),
    };

    chosen.map(|s| s.node)
}

/// Dot product of node velocity with the vector from node to zone center.
/// Positive means the node is approaching the zone; larger is better.
fn krios_metric(anchor: CartesianKm, position: CartesianKm, velocity_kms: (f64, f64, f64)) -> f64 {
    let (vx, vy, vz) = velocity_kms;
    (anchor.x - position.x) * vx + (anchor.y - position.y) * vy + (anchor.z - position.z) * vz
}

/// Score every candidate and select one per `mode`. `candidates` is assumed
/// non-empty by callers that have already handled the empty case per the
/// component contract (§4.4); an empty slice simply yields `None`.
pub fn select_successor(
    catalog: &SatelliteCatalog,
    candidates: &[Node],
    workload: &Workload,
    instant: DateTime<Utc>,
    mode: SuccessorMode,
) -> Result<Option<Node>> {
    if candidates.is_empty() {
        return Ok(None);
    }

    if mode == SuccessorMode::Random {
        let mut rng = rand::thread_rng();
        return Ok(candidates.choose(&mut rng).cloned());
    }

    let (center_lat, center_lon) = workload.zone_center;
    let anchor = zone_anchor(center_lat, center_lon, ALTITUDE_KM);

    let mut scored = Vec::with_capacity(candidates.len());
    for node in candidates {
        let sample = match catalog.propagate(node.sat_id, instant) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(node = %node.name, error = %e, "skipping candidate during scoring");
                continue;
            }
        };

        let dist_km = distance(sample.position, anchor);
        let metric = krios_metric(anchor, sample.position, sample.velocity_kms);
        debug!(node = %node.name, dist_km, krios_metric = metric, "scored candidate");

        scored.push(Scored {
            node: node.clone(),
            dist_km,
            krios_metric: metric,
        });
    }

    Ok(select_from_scored(scored, mode))
}
