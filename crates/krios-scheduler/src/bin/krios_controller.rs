//! Handover Controller binary (§4.7): long-running 1-second tick loop that
//! tracks running workloads and migrates each to a successor node just
//! before its current node leaves the workload's zone.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use krios_cluster::{ClusterAdapter, InMemoryCluster, Node};
use krios_ephemeris::load_tle_file;
use krios_scheduler::config::ControllerArgs;
use krios_scheduler::controller::run_controller;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ControllerArgs::parse();

    let filter = if args.verbose {
        "krios_controller=debug,krios_scheduler=debug,info"
    } else {
        "krios_controller=info,krios_scheduler=info,warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| filter.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(tles = ?args.tles, "loading satellite catalog");
    let catalog = Arc::new(load_tle_file(&args.tles)?);
    tracing::info!(satellites = catalog.len(), "catalog loaded");

    // Local demo wiring: a production deployment substitutes a cluster
    // client that implements `ClusterAdapter` against the orchestrator's
    // real watch/bind API. This in-process fake starts empty; it only
    // demonstrates the tick loop running cleanly with nothing tracked yet.
    let cluster: Arc<dyn ClusterAdapter> = Arc::new(InMemoryCluster::new(Vec::<Node>::new()));

    tracing::info!(
        lookahead = args.lookahead(),
        successor_mode = ?args.successor_mode,
        namespace = %args.namespace,
        "starting handover controller"
    );

    run_controller(
        cluster,
        catalog,
        args.lookahead(),
        args.ground_station(),
        args.successor_mode,
    )
    .await?;

    Ok(())
}
