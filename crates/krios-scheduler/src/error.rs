use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("cluster adapter error: {0}")]
    Cluster(#[from] krios_cluster::ClusterError),

    #[error("ephemeris error: {0}")]
    Ephemeris(#[from] krios_ephemeris::EphemerisError),

    #[error("no candidate node in zone for workload {0:?}")]
    NoCandidate(String),

    #[error("workload {0:?} has no resolvable current node ({1:?})")]
    UnresolvedNode(String, String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
