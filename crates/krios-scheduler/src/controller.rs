//! Handover Controller (§4.2, §4.7): predicts when a running workload's node
//! will leave its zone and cuts the workload over to a successor ahead of
//! (or exactly at) that departure.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use krios_cluster::{ClusterAdapter, Node, Workload};
use krios_ephemeris::SatelliteCatalog;
use krios_geometry::geodetic_to_cartesian;
use tokio::sync::Mutex;
use tokio::time::{interval, sleep};
use tracing::{error, info, warn};

use crate::config::{GroundStation, SuccessorMode};
use crate::constants::GROUND_LINK_ALTITUDE_M;
use crate::departure::predict_departure;
use crate::error::{Result, SchedulerError};
use crate::filter::zone_nodes;
use crate::lead_margin::{default_rtt_ms, ground_to_node_distance_km, lead_margin_secs};
use crate::scorer::select_successor;

const TICK_PERIOD: StdDuration = StdDuration::from_secs(1);
const READINESS_POLL_PERIOD: StdDuration = StdDuration::from_secs(1);

/// Derive the successor workload's name from the current one by stripping
/// the current node's suffix (if present) and appending the successor's.
pub fn derive_successor_name(workload_name: &str, current_node: &str, successor_node: &str) -> String {
    let suffix = format!("-{current_node}");
    let base = workload_name.strip_suffix(&suffix).unwrap_or(workload_name);
    format!("{base}-{successor_node}")
}

fn find_node<'a>(nodes: &'a [Node], name: &str) -> Option<&'a Node> {
    nodes.iter().find(|n| n.name == name)
}

/// Create the successor workload, wait for it to report ready, then delete
/// the original. The delete is never issued before a ready observation —
/// this ordering is the invariant under test in scenario S5.
pub async fn cutover(
    cluster: &dyn ClusterAdapter,
    workload: &Workload,
    successor_node: &str,
    successor_name: &str,
) -> Result<()> {
    let created = cluster
        .create_workload(workload, successor_name, successor_node)
        .await?;

    loop {
        if cluster.is_workload_ready(&created).await? {
            break;
        }
        sleep(READINESS_POLL_PERIOD).await;
    }

    cluster.delete_workload(workload).await?;
    info!(workload = %workload.name, successor = %successor_name, node = %successor_node, "cutover complete");
    Ok(())
}

/// Predict the departure of `workload`'s current node, wait until the lead
/// margin before that instant (or until the departure itself with lookahead
/// disabled), then select and cut over to a successor. Runs as its own task
/// per tracked workload.
async fn run_handover(
    cluster: Arc<dyn ClusterAdapter>,
    catalog: Arc<SatelliteCatalog>,
    workload: Workload,
    lookahead: bool,
    ground_station: GroundStation,
    mode: SuccessorMode,
) -> Result<()> {
    let current_node_name = workload
        .assigned_node_name
        .clone()
        .ok_or_else(|| SchedulerError::UnresolvedNode(workload.name.clone(), "<none>".to_string()))?;

    let nodes = cluster.list_follower_nodes().await?;
    let current_node = find_node(&nodes, &current_node_name)
        .ok_or_else(|| SchedulerError::UnresolvedNode(workload.name.clone(), current_node_name.clone()))?
        .clone();

    let (center_lat, center_lon) = workload.zone_center;
    let now = Utc::now();
    let departure = predict_departure(
        &catalog,
        current_node.sat_id,
        center_lat,
        center_lon,
        workload.zone_radius_km,
        now,
    )?;

    // Ground-to-satellite distance at tick time drives the RTT term of the
    // lead margin (§4.8). The ground station anchor is computed with the
    // constellation altitude rather than its configured elevation, the same
    // unit quirk as the zone anchor above.
    let ground_pos = geodetic_to_cartesian(
        ground_station.lat_deg,
        ground_station.lon_deg,
        GROUND_LINK_ALTITUDE_M,
    );
    let current_sample = catalog.propagate(current_node.sat_id, now)?;
    let ground_distance_km = ground_to_node_distance_km(ground_pos, current_sample.position);
    let rtt_ms = default_rtt_ms(ground_distance_km);

    let margin_secs = lead_margin_secs(lookahead, rtt_ms);
    let fire_at = departure - chrono::Duration::milliseconds((margin_secs * 1000.0) as i64);

    let wait = fire_at - Utc::now();
    if wait > chrono::Duration::zero() {
        if let Ok(std_wait) = wait.to_std() {
            sleep(std_wait).await;
        }
    }

    let candidates = zone_nodes(cluster.as_ref(), &catalog, &workload, Utc::now()).await?;
    let successor = match select_successor(&catalog, &candidates, &workload, Utc::now(), mode)? {
        Some(node) => node,
        None => {
            warn!(workload = %workload.name, "no successor available at handover time");
            return Ok(());
        }
    };

    let successor_name = derive_successor_name(&workload.name, &current_node_name, &successor.name);
    cutover(cluster.as_ref(), &workload, &successor.name, &successor_name).await
}

/// Outer control loop: once per tick, scan running workloads and spawn a
/// handover task for any not already tracked and ready (§4.7 step 2a). The
/// tracked set only grows within a single tick's scan — it is never written
/// anywhere else, so no lock is needed around it.
pub async fn run_controller(
    cluster: Arc<dyn ClusterAdapter>,
    catalog: Arc<SatelliteCatalog>,
    lookahead: bool,
    ground_station: GroundStation,
    mode: SuccessorMode,
) -> Result<()> {
    let tracked: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
    let mut ticker = interval(TICK_PERIOD);

    loop {
        ticker.tick().await;

        let workloads = match cluster.list_workloads().await {
            Ok(w) => w,
            Err(e) => {
                error!(error = %e, "failed to list workloads this tick");
                continue;
            }
        };

        let mut guard = tracked.lock().await;
        for workload in workloads {
            if workload.is_pending() || guard.contains(&workload.name) || !workload.ready {
                continue;
            }

            guard.insert(workload.name.clone());

            let cluster = cluster.clone();
            let catalog = catalog.clone();
            let name = workload.name.clone();
            tokio::spawn(async move {
                if let Err(e) = run_handover(cluster, catalog, workload, lookahead, ground_station, mode).await {
                    error!(workload = %name, error = %e, "handover task failed");
                }
            });
        }
        drop(guard);
    }
}
