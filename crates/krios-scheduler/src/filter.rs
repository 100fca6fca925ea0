//! Zone Filter (§4.3): which follower nodes currently overfly a workload's
//! service zone.

use chrono::{DateTime, Utc};
use krios_cluster::{ClusterAdapter, Node, Workload};
use krios_ephemeris::SatelliteCatalog;
use krios_geometry::{allowable_distance, distance, zone_anchor};
use tracing::{debug, warn};

use crate::constants::{elevation_angle_rad, ALTITUDE_KM};
use crate::error::Result;

/// Nodes currently visible from `workload`'s zone at `instant`, excluding the
/// workload's current node — a handover onto oneself is meaningless.
///
/// Strict less-than against the allowable distance: ties at the boundary
/// are out of zone. Result order follows the cluster adapter's iteration
/// order; callers must not depend on a particular ordering.
pub async fn zone_nodes(
    cluster: &dyn ClusterAdapter,
    catalog: &SatelliteCatalog,
    workload: &Workload,
    instant: DateTime<Utc>,
) -> Result<Vec<Node>> {
    let nodes = cluster.list_follower_nodes().await?;

    let (center_lat, center_lon) = workload.zone_center;
    let anchor = zone_anchor(center_lat, center_lon, ALTITUDE_KM);
    let allowable = allowable_distance(workload.zone_radius_km, ALTITUDE_KM, elevation_angle_rad());

    let mut in_zone = Vec::new();
    for node in nodes {
        if workload.assigned_node_name.as_deref() == Some(node.name.as_str()) {
            continue;
        }

        let sample = match catalog.propagate(node.sat_id, instant) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(node = %node.name, sat_id = node.sat_id, error = %e, "skipping node for this decision");
                continue;
            }
        };

        let d = distance(sample.position, anchor);
        debug!(
            node = %node.name,
            sat_id = node.sat_id,
            workload = %workload.name,
            distance_km = d,
            allowable_km = allowable,
            "evaluated node against zone"
        );

        if d < allowable {
            in_zone.push(node);
        }
    }

    Ok(in_zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use krios_cluster::{InMemoryCluster, NodeRole};

    fn workload(assigned: Option<&str>) -> Workload {
        Workload {
            name: "w1".to_string(),
            namespace: "default".to_string(),
            assigned_node_name: assigned.map(str::to_string),
            ready: true,
            zone_center: (38.875, -121.707),
            zone_radius_km: 100.0,
        }
    }

    #[tokio::test]
    async fn empty_catalog_yields_no_candidates() {
        let nodes = vec![Node::new("n1", 1, NodeRole::Follower)];
        let cluster = InMemoryCluster::new(nodes);
        let catalog = SatelliteCatalog::default();

        let result = zone_nodes(&cluster, &catalog, &workload(None), Utc::now()).await.unwrap();
        assert!(result.is_empty());
    }

    const SAMPLE_TLE_LINE1: &str = "1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9994";
    const SAMPLE_TLE_LINE2: &str = "2 25544  51.6423 253.5360 0008413  91.3342 330.0527 15.50061756 23456";

    fn single_sat_catalog() -> SatelliteCatalog {
        SatelliteCatalog::from_entries([(
            25544,
            krios_ephemeris::TleEntry {
                line1: SAMPLE_TLE_LINE1.to_string(),
                line2: SAMPLE_TLE_LINE2.to_string(),
            },
        )])
    }

    proptest::proptest! {
        // Invariant 1 (§8): the workload's current node is never in its own
        // zone_nodes result, for every possible assigned index. All nodes
        // here map to the same satellite (and thus the same position), so
        // with a generous zone radius every node but the assigned one is
        // "in zone" — a non-trivial exercise of the exclusion rule.
        #[test]
        fn assigned_node_is_always_excluded(assigned_idx in 0usize..5) {
            let node_names = ["a", "b", "c", "d", "e"];
            let nodes: Vec<Node> = node_names.iter().map(|n| Node::new(*n, 25544, NodeRole::Follower)).collect();
            let assigned = node_names[assigned_idx];

            let cluster = InMemoryCluster::new(nodes);
            let catalog = single_sat_catalog();
            let w = workload(Some(assigned));

            let result = tokio::runtime::Runtime::new().unwrap().block_on(async {
                zone_nodes(&cluster, &catalog, &w, Utc::now()).await.unwrap()
            });

            proptest::prop_assert!(result.iter().all(|n| n.name != assigned));
        }
    }
}
