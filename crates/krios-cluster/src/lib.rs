//! Typed node/workload wrappers and the cluster orchestrator adapter.
//!
//! The cluster orchestrator itself (pod/node registry, binding API, watch
//! stream, pod lifecycle) is deliberately out of scope: this crate only
//! specifies the interface the scheduling core consumes ([`ClusterAdapter`])
//! and ships one concrete implementation, [`InMemoryCluster`], that is
//! enough to drive the control loops end-to-end in tests and local demos.
//! Wiring a real orchestrator client behind the same trait is an
//! integration concern for whoever deploys this.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("missing label {0:?} on external record")]
    MissingLabel(&'static str),
    #[error("invalid value for label {label:?}: {value:?}")]
    InvalidLabel { label: &'static str, value: String },
    #[error("no such workload {0:?} in namespace {1:?}")]
    WorkloadNotFound(String, String),
    #[error("no such node {0:?}")]
    NodeNotFound(String),
    #[error("cluster API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, ClusterError>;

/// Raw labels as the external orchestrator would hand them to us —
/// dynamic string attribute access that we convert into typed fields at the
/// boundary, failing with a tagged error on absence rather than panicking.
pub type RawLabels = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Schedulable — eligible to host workloads.
    Follower,
    /// Control-plane or otherwise non-schedulable.
    Other,
}

/// An external node record, reduced to the attributes the core reads.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub sat_id: i64,
    pub role: NodeRole,
}

impl Node {
    pub fn new(name: impl Into<String>, sat_id: i64, role: NodeRole) -> Self {
        Self {
            name: name.into(),
            sat_id,
            role,
        }
    }

    /// Build a node from its raw labels, reading `sat_id1` preferentially
    /// over `sat_id` when both are present.
    pub fn from_labels(name: impl Into<String>, role: NodeRole, labels: &RawLabels) -> Result<Self> {
        let raw = labels
            .get("sat_id1")
            .or_else(|| labels.get("sat_id"))
            .ok_or(ClusterError::MissingLabel("sat_id"))?;

        let sat_id = raw.trim().parse::<i64>().map_err(|_| ClusterError::InvalidLabel {
            label: "sat_id",
            value: raw.clone(),
        })?;

        Ok(Self::new(name, sat_id, role))
    }

    pub fn is_follower(&self) -> bool {
        self.role == NodeRole::Follower
    }
}

/// An external workload record, reduced to the attributes the core reads.
#[derive(Debug, Clone)]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    pub assigned_node_name: Option<String>,
    pub ready: bool,
    pub zone_center: (f64, f64),
    pub zone_radius_km: f64,
}

/// Default zone radius (km) when the `radius` label is absent.
pub const DEFAULT_ZONE_RADIUS_KM: f64 = 100.0;

impl Workload {
    /// Build a workload from its raw labels. `leozone` is required; `radius`
    /// falls back to [`DEFAULT_ZONE_RADIUS_KM`] when absent or unparseable.
    pub fn from_labels(
        name: impl Into<String>,
        namespace: impl Into<String>,
        assigned_node_name: Option<String>,
        ready: bool,
        labels: &RawLabels,
    ) -> Result<Self> {
        let leozone = labels
            .get("leozone")
            .ok_or(ClusterError::MissingLabel("leozone"))?;
        let zone_center = parse_leozone(leozone)?;

        let zone_radius_km = labels
            .get("radius")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|r| *r > 0.0)
            .unwrap_or(DEFAULT_ZONE_RADIUS_KM);

        Ok(Self {
            name: name.into(),
            namespace: namespace.into(),
            assigned_node_name,
            ready,
            zone_center,
            zone_radius_km,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.assigned_node_name.is_none()
    }
}

/// Parse a `"lat,lon"` zone-center label into a geodetic pair.
fn parse_leozone(raw: &str) -> Result<(f64, f64)> {
    let (lat_s, lon_s) = raw
        .split_once(',')
        .ok_or_else(|| ClusterError::InvalidLabel {
            label: "leozone",
            value: raw.to_string(),
        })?;

    let lat = lat_s.trim().parse::<f64>().map_err(|_| ClusterError::InvalidLabel {
        label: "leozone",
        value: raw.to_string(),
    })?;
    let lon = lon_s.trim().parse::<f64>().map_err(|_| ClusterError::InvalidLabel {
        label: "leozone",
        value: raw.to_string(),
    })?;

    Ok((lat, lon))
}

/// Stream of pending-workload watch events.
pub type PendingWorkloadStream = mpsc::Receiver<Workload>;

/// The cluster orchestrator interface the scheduling core depends on.
/// Implemented by [`InMemoryCluster`] for tests and local demos; a
/// production deployment wires a real orchestrator client behind this same
/// trait.
#[async_trait]
pub trait ClusterAdapter: Send + Sync {
    async fn list_follower_nodes(&self) -> Result<Vec<Node>>;
    async fn list_workloads(&self) -> Result<Vec<Workload>>;
    async fn get_workload(&self, name: &str, namespace: &str) -> Result<Workload>;
    async fn is_workload_ready(&self, workload: &Workload) -> Result<bool>;
    async fn bind_workload(&self, namespace: &str, workload_name: &str, node_name: &str) -> Result<()>;
    async fn create_workload(
        &self,
        template: &Workload,
        new_name: &str,
        assigned_node: &str,
    ) -> Result<Workload>;
    async fn delete_workload(&self, workload: &Workload) -> Result<()>;
    async fn watch_pending_workloads(&self, namespace: &str) -> Result<PendingWorkloadStream>;
}

/// One call observed against [`InMemoryCluster`], recorded for test
/// assertions on cutover ordering (create → poll-ready → delete, never the
/// reverse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    Bind { namespace: String, workload: String, node: String },
    Create { new_name: String, node: String },
    ReadinessPoll { workload: String, ready: bool },
    Delete { workload: String },
}

#[derive(Default)]
struct ClusterState {
    nodes: Vec<Node>,
    workloads: HashMap<String, Workload>,
    calls: Vec<ClusterCall>,
}

/// An in-process fake cluster adapter: no real orchestrator, no network —
/// just an owned registry guarded by a single mutex, enough to drive the
/// placement decider and handover controller end-to-end in tests.
#[derive(Clone)]
pub struct InMemoryCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl InMemoryCluster {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClusterState {
                nodes,
                workloads: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    pub async fn insert_workload(&self, workload: Workload) {
        let mut state = self.state.lock().await;
        state.workloads.insert(workload.name.clone(), workload);
    }

    pub async fn set_ready(&self, name: &str, ready: bool) {
        let mut state = self.state.lock().await;
        if let Some(w) = state.workloads.get_mut(name) {
            w.ready = ready;
        }
    }

    pub async fn calls(&self) -> Vec<ClusterCall> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl ClusterAdapter for InMemoryCluster {
    async fn list_follower_nodes(&self) -> Result<Vec<Node>> {
        let state = self.state.lock().await;
        Ok(state.nodes.iter().filter(|n| n.is_follower()).cloned().collect())
    }

    async fn list_workloads(&self) -> Result<Vec<Workload>> {
        let state = self.state.lock().await;
        Ok(state.workloads.values().cloned().collect())
    }

    async fn get_workload(&self, name: &str, namespace: &str) -> Result<Workload> {
        let state = self.state.lock().await;
        state
            .workloads
            .get(name)
            .filter(|w| w.namespace == namespace)
            .cloned()
            .ok_or_else(|| ClusterError::WorkloadNotFound(name.to_string(), namespace.to_string()))
    }

    async fn is_workload_ready(&self, workload: &Workload) -> Result<bool> {
        let mut state = self.state.lock().await;
        let ready = state
            .workloads
            .get(&workload.name)
            .map(|w| w.ready)
            .unwrap_or(false);
        state.calls.push(ClusterCall::ReadinessPoll {
            workload: workload.name.clone(),
            ready,
        });
        Ok(ready)
    }

    async fn bind_workload(&self, namespace: &str, workload_name: &str, node_name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let workload = state
            .workloads
            .get_mut(workload_name)
            .ok_or_else(|| ClusterError::WorkloadNotFound(workload_name.to_string(), namespace.to_string()))?;
        workload.assigned_node_name = Some(node_name.to_string());
        state.calls.push(ClusterCall::Bind {
            namespace: namespace.to_string(),
            workload: workload_name.to_string(),
            node: node_name.to_string(),
        });
        info!(workload = workload_name, node = node_name, "bound workload to node");
        Ok(())
    }

    async fn create_workload(
        &self,
        template: &Workload,
        new_name: &str,
        assigned_node: &str,
    ) -> Result<Workload> {
        let clone = Workload {
            name: new_name.to_string(),
            namespace: template.namespace.clone(),
            assigned_node_name: Some(assigned_node.to_string()),
            ready: false,
            zone_center: template.zone_center,
            zone_radius_km: template.zone_radius_km,
        };

        let mut state = self.state.lock().await;
        state.workloads.insert(clone.name.clone(), clone.clone());
        state.calls.push(ClusterCall::Create {
            new_name: new_name.to_string(),
            node: assigned_node.to_string(),
        });
        debug!(new_name, assigned_node, "created successor workload");
        Ok(clone)
    }

    async fn delete_workload(&self, workload: &Workload) -> Result<()> {
        let mut state = self.state.lock().await;
        state.workloads.remove(&workload.name);
        state.calls.push(ClusterCall::Delete {
            workload: workload.name.clone(),
        });
        info!(workload = %workload.name, "deleted original workload after successful cutover");
        Ok(())
    }

    async fn watch_pending_workloads(&self, namespace: &str) -> Result<PendingWorkloadStream> {
        let (tx, rx) = mpsc::channel(16);
        let state = self.state.clone();
        let namespace = namespace.to_string();
        tokio::spawn(async move {
            let pending: Vec<Workload> = {
                let state = state.lock().await;
                state
                    .workloads
                    .values()
                    .filter(|w| w.namespace == namespace && w.is_pending())
                    .cloned()
                    .collect()
            };
            for w in pending {
                if tx.send(w).await.is_err() {
                    warn!("pending workload watch receiver dropped");
                    break;
                }
            }
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_workload(name: &str, assigned: Option<&str>) -> Workload {
        Workload {
            name: name.to_string(),
            namespace: "default".to_string(),
            assigned_node_name: assigned.map(str::to_string),
            ready: true,
            zone_center: (38.875, -121.707),
            zone_radius_km: 100.0,
        }
    }

    #[test]
    fn node_prefers_sat_id1_over_sat_id() {
        let mut labels = RawLabels::new();
        labels.insert("sat_id".to_string(), "1".to_string());
        labels.insert("sat_id1".to_string(), "2".to_string());
        let node = Node::from_labels("n1", NodeRole::Follower, &labels).unwrap();
        assert_eq!(node.sat_id, 2);
    }

    #[test]
    fn node_missing_sat_id_is_a_tagged_error() {
        let labels = RawLabels::new();
        let err = Node::from_labels("n1", NodeRole::Follower, &labels).unwrap_err();
        assert!(matches!(err, ClusterError::MissingLabel("sat_id")));
    }

    #[test]
    fn workload_radius_falls_back_to_default() {
        let mut labels = RawLabels::new();
        labels.insert("leozone".to_string(), "38.875,-121.707".to_string());
        let workload = Workload::from_labels("w1", "default", None, true, &labels).unwrap();
        assert_eq!(workload.zone_radius_km, DEFAULT_ZONE_RADIUS_KM);
    }

    #[tokio::test]
    async fn bind_workload_sets_assignment_and_records_call() {
        let cluster = InMemoryCluster::new(vec![]);
        cluster.insert_workload(sample_workload("w1", None)).await;

        cluster.bind_workload("default", "w1", "node-a").await.unwrap();

        let w = cluster.get_workload("w1", "default").await.unwrap();
        assert_eq!(w.assigned_node_name.as_deref(), Some("node-a"));
        assert_eq!(
            cluster.calls().await,
            vec![ClusterCall::Bind {
                namespace: "default".into(),
                workload: "w1".into(),
                node: "node-a".into(),
            }]
        );
    }

    #[tokio::test]
    async fn create_then_delete_preserves_original_until_successor_exists() {
        let cluster = InMemoryCluster::new(vec![]);
        let original = sample_workload("w1-node-a", Some("node-a"));
        cluster.insert_workload(original.clone()).await;

        let successor = cluster.create_workload(&original, "w1-node-b", "node-b").await.unwrap();
        assert!(cluster.get_workload(&original.name, "default").await.is_ok());

        cluster.delete_workload(&original).await.unwrap();
        assert!(cluster.get_workload(&original.name, "default").await.is_err());
        assert!(cluster.get_workload(&successor.name, "default").await.is_ok());
    }
}
