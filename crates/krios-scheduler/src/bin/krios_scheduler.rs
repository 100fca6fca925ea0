//! Initial Placement Decider binary (§4.6): one-shot pass over pending
//! workloads, binding each to a feasible follower node.

use anyhow::Result;
use clap::Parser;
use krios_cluster::{InMemoryCluster, Node};
use krios_ephemeris::load_tle_file;
use krios_scheduler::config::{SchedulerArgs, SuccessorMode};
use krios_scheduler::placement::place_pending_workloads;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = SchedulerArgs::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!(tles = ?args.tles, "loading satellite catalog");
    let catalog = load_tle_file(&args.tles)?;
    info!(satellites = catalog.len(), "catalog loaded");

    // Local demo wiring: a real deployment substitutes a cluster client that
    // implements `ClusterAdapter` against the orchestrator's actual API;
    // this in-process fake has no nodes or workloads of its own, so it only
    // demonstrates that the pass completes cleanly when nothing is pending.
    let cluster = InMemoryCluster::new(Vec::<Node>::new());

    let placed = place_pending_workloads(&cluster, &catalog, SuccessorMode::Krios).await?;
    info!(placed, "placement pass complete");

    Ok(())
}
