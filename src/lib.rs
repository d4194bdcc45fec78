// cargo watch -x 'fmt' -x 'run'

pub mod config;
pub mod error;
pub mod models;
pub mod openstack;
pub mod output;
pub mod provision;

use config::{CloudConfig, NUM_NETWORKS, START_NUM};
use openstack::OpenStackConnector;
use provision::RunOutcome;

pub use error::{CloudError, UnitError};
pub use provision::{create_network_task, spawn_networks};

/// Indices of a full run, `START_NUM..START_NUM + NUM_NETWORKS`.
pub fn run_range() -> std::ops::Range<u32> {
    START_NUM..START_NUM + NUM_NETWORKS
}

/// Create every network of the run against the configured cloud.
///
/// Prints the report when all units finished. On Ctrl-C returns
/// [`RunOutcome::Interrupted`] straight away.
pub async fn run() -> RunOutcome {
    let workers = num_cpus::get();
    println!("Creating {NUM_NETWORKS} networks using {workers} workers...");

    let connector = connector_from_env();
    let started = chrono::Local::now();
    let outcome = provision::run_until(&connector, run_range(), workers, provision::ctrl_c()).await;

    match &outcome {
        RunOutcome::Completed(summary) => {
            output::print_summary(summary, started, chrono::Local::now());
        }
        RunOutcome::Interrupted => {
            println!("\nTermination signal received. Shutting down all workers...");
        }
    }
    outcome
}

/// Resolve the cloud once for the whole run.
///
/// A configuration error is not fatal here: the connector falls back to
/// resolving per unit, so each unit reports it as its own connect failure.
fn connector_from_env() -> OpenStackConnector {
    match CloudConfig::from_env() {
        Ok(config) => OpenStackConnector::with_config(config),
        Err(e) => {
            log::warn!("Cloud configuration unavailable, resolving per unit: {e}");
            OpenStackConnector::default()
        }
    }
}
