//! Initial Placement Decider (§4.1, §4.6): assigns a follower node to each
//! pending workload.

use chrono::Utc;
use krios_cluster::{ClusterAdapter, Workload};
use krios_ephemeris::SatelliteCatalog;
use tracing::{error, info, warn};

use crate::config::SuccessorMode;
use crate::error::{Result, SchedulerError};
use crate::filter::zone_nodes;
use crate::scorer::select_successor;

/// Decide and bind a node for one workload. A workload that already carries
/// an assignment is bound to that same node — placement is idempotent, not a
/// re-placement trigger, but the bind call still happens.
pub async fn place_workload(
    cluster: &dyn ClusterAdapter,
    catalog: &SatelliteCatalog,
    workload: &Workload,
    mode: SuccessorMode,
) -> Result<()> {
    if let Some(assigned_name) = workload.assigned_node_name.as_deref() {
        cluster
            .bind_workload(&workload.namespace, &workload.name, assigned_name)
            .await?;
        info!(workload = %workload.name, node = assigned_name, "re-bound already-assigned workload");
        return Ok(());
    }

    let now = Utc::now();
    let candidates = zone_nodes(cluster, catalog, workload, now).await?;

    let chosen = select_successor(catalog, &candidates, workload, now, mode)?
        .ok_or_else(|| SchedulerError::NoCandidate(workload.name.clone()))?;

    cluster
        .bind_workload(&workload.namespace, &workload.name, &chosen.name)
        .await?;

    info!(workload = %workload.name, node = %chosen.name, "placed workload");
    Ok(())
}

/// Drive one pass over every currently pending workload. A failure placing
/// one workload is logged and does not prevent the others from being tried —
/// per the component's error-handling contract, placement failures are
/// per-workload, not fleet-wide.
pub async fn place_pending_workloads(
    cluster: &dyn ClusterAdapter,
    catalog: &SatelliteCatalog,
    mode: SuccessorMode,
) -> Result<usize> {
    let workloads = cluster.list_workloads().await?;
    let mut placed = 0;

    for workload in workloads.iter().filter(|w| w.is_pending()) {
        match place_workload(cluster, catalog, workload, mode).await {
            Ok(()) => placed += 1,
            Err(SchedulerError::NoCandidate(name)) => {
                warn!(workload = %name, "no candidate node in zone this pass");
            }
            Err(e) => {
                error!(workload = %workload.name, error = %e, "failed to place workload");
            }
        }
    }

    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use krios_cluster::{InMemoryCluster, Node, NodeRole};

    fn pending_workload() -> Workload {
        Workload {
            name: "w1".to_string(),
            namespace: "default".to_string(),
            assigned_node_name: None,
            ready: false,
            zone_center: (38.875, -121.707),
            zone_radius_km: 100.0,
        }
    }

    #[tokio::test]
    async fn already_assigned_workload_is_rebound_to_the_same_node() {
        let cluster = InMemoryCluster::new(vec![Node::new("n1", 1, NodeRole::Follower)]);
        let catalog = SatelliteCatalog::default();

        let mut workload = pending_workload();
        workload.assigned_node_name = Some("n1".to_string());
        cluster.insert_workload(workload.clone()).await;

        place_workload(&cluster, &catalog, &workload, SuccessorMode::Krios).await.unwrap();
        assert_eq!(
            cluster.calls().await,
            vec![krios_cluster::ClusterCall::Bind {
                namespace: "default".into(),
                workload: "w1".into(),
                node: "n1".into(),
            }]
        );
    }

    #[tokio::test]
    async fn no_candidates_yields_no_candidate_error() {
        let cluster = InMemoryCluster::new(vec![Node::new("n1", 1, NodeRole::Follower)]);
        let catalog = SatelliteCatalog::default();

        let err = place_workload(&cluster, &catalog, &pending_workload(), SuccessorMode::Krios)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NoCandidate(_)));
    }
}
