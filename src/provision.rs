//! Per-unit provisioning and the bounded driver that fans units out.
//!
//! A unit checks its address block, opens its own session, creates the
//! network and then the subnet. Every failure is caught at the unit and
//! returned as a [`UnitError`]; nothing is retried and nothing is rolled back.

use crate::error::{CloudError, UnitError, UNKNOWN_ID};
use crate::models::{NetworkUnit, ProvisionedUnit, Summary, UnitResult};
use crate::openstack::{Connector, NetworkApi, SubnetRequest};
use colored::Colorize;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::ops::Range;

const IP_VERSION: u8 = 4;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Summary),
    /// The shutdown signal fired first. In-flight requests are abandoned.
    Interrupted,
}

/// Create the network and subnet for `index`, reporting progress and failure.
pub async fn create_network_task<C: Connector>(connector: &C, index: u32) -> UnitResult {
    let result = provision_unit(connector, index).await;
    match &result {
        Ok(provisioned) => {
            log::info!(
                "Unit {index} done network_id={} subnet_id={}",
                provisioned.network_id,
                provisioned.subnet_id
            );
        }
        Err(e) => {
            log::warn!("Unit {index} failed kind={} error={e}", e.kind());
            eprintln!("Process {index}: {}", e.to_string().red());
        }
    }
    result
}

async fn provision_unit<C: Connector>(connector: &C, index: u32) -> UnitResult {
    // Checked before connecting, a skipped unit never touches the cloud.
    let unit = NetworkUnit::new(index)?;

    let session = connector.connect().await.map_err(UnitError::Auth)?;

    println!(
        "Process {index}: Creating network {name}",
        name = unit.network_name
    );
    let network = match session.create_network(&unit.network_name).await {
        Ok(network) => network,
        // Accepted but no id to hang a subnet on: the network exists regardless.
        Err(source @ CloudError::Unreadable { .. }) => {
            return Err(UnitError::CreateSubnetFailed {
                network_name: unit.network_name,
                network_id: UNKNOWN_ID.to_string(),
                source,
            })
        }
        Err(source) => {
            return Err(UnitError::CreateNetworkFailed {
                network_name: unit.network_name,
                source,
            })
        }
    };
    log::debug!(
        "Created network {} id={} status={:?}",
        network.name,
        network.id,
        network.status
    );

    let request = SubnetRequest {
        name: unit.subnet_name.clone(),
        network_id: network.id.clone(),
        ip_version: IP_VERSION,
        cidr: unit.cidr,
    };
    log::debug!("Creating subnet {} cidr={}", request.name, request.cidr);
    let subnet_id = match session.create_subnet(&request).await {
        Ok(subnet) => subnet.id,
        Err(CloudError::Unreadable { message, .. }) => {
            log::warn!("Unit {index} subnet created but its id is unknown: {message}");
            UNKNOWN_ID.to_string()
        }
        Err(source) => {
            return Err(UnitError::CreateSubnetFailed {
                network_name: unit.network_name,
                network_id: network.id,
                source,
            })
        }
    };

    println!(
        "Process {index}: Successfully created {name}",
        name = unit.network_name.green()
    );

    Ok(ProvisionedUnit {
        unit,
        network_id: network.id,
        subnet_id,
    })
}

/// Run every index through at most `workers` concurrent units and collect the outcomes.
pub async fn spawn_networks<C: Connector>(
    connector: &C,
    indices: Range<u32>,
    workers: usize,
) -> Summary {
    let mut summary = Summary::new(indices.len());
    log::info!(
        "spawn_networks({}..{}) total={} workers={workers}",
        indices.start,
        indices.end,
        summary.total
    );

    let mut outcomes = stream::iter(indices)
        .map(|index| async move { (index, create_network_task(connector, index).await) })
        .buffer_unordered(workers.max(1));

    while let Some((index, result)) = outcomes.next().await {
        summary.record(index, result);
    }

    summary.sort();
    summary
}

/// Like [`spawn_networks`], but gives up as soon as `shutdown` resolves.
pub async fn run_until<C, F>(
    connector: &C,
    indices: Range<u32>,
    workers: usize,
    shutdown: F,
) -> RunOutcome
where
    C: Connector,
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = shutdown => {
            log::warn!("Shutdown requested, abandoning in-flight units");
            RunOutcome::Interrupted
        }
        summary = spawn_networks(connector, indices, workers) => RunOutcome::Completed(summary),
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Unable to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
