//! Per-unit results and the run summary built from them.

use super::NetworkUnit;
use crate::error::UnitError;

/// A unit whose network and subnet were both created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedUnit {
    pub unit: NetworkUnit,
    pub network_id: String,
    pub subnet_id: String,
}

/// Result of one worker invocation.
pub type UnitResult = Result<ProvisionedUnit, UnitError>;

/// Aggregated outcome of a run.
#[derive(Debug, Default)]
pub struct Summary {
    /// Units handed to the pool.
    pub total: usize,
    pub created: Vec<ProvisionedUnit>,
    /// Failed units keyed by index, in completion order.
    pub failures: Vec<(u32, UnitError)>,
}

impl Summary {
    pub fn new(total: usize) -> Summary {
        Summary {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, index: u32, result: UnitResult) {
        match result {
            Ok(provisioned) => self.created.push(provisioned),
            Err(e) => self.failures.push((index, e)),
        }
    }

    /// Units that produced an outcome, successful or not.
    pub fn completed(&self) -> usize {
        self.created.len() + self.failures.len()
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.failures.iter().filter(|(_, e)| e.kind() == kind).count()
    }

    /// Networks left without a subnet, as `(index, network_id)`.
    pub fn orphaned_networks(&self) -> Vec<(u32, &str)> {
        self.failures
            .iter()
            .filter_map(|(i, e)| e.orphaned_network_id().map(|id| (*i, id)))
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.completed() == self.total
    }

    /// Sort created units and failures by index for stable reporting.
    pub fn sort(&mut self) {
        self.created.sort_by_key(|p| p.unit.index);
        self.failures.sort_by_key(|(i, _)| *i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CloudError;

    fn provisioned(index: u32) -> ProvisionedUnit {
        ProvisionedUnit {
            unit: NetworkUnit::new(index).unwrap(),
            network_id: format!("net-{index}"),
            subnet_id: format!("sub-{index}"),
        }
    }

    #[test]
    fn test_record_and_counts() {
        let mut summary = Summary::new(4);
        summary.record(21, Ok(provisioned(21)));
        summary.record(20, Ok(provisioned(20)));
        summary.record(
            23,
            Err(UnitError::CreateSubnetFailed {
                network_name: "spawn_network-23".to_string(),
                network_id: "net-23".to_string(),
                source: CloudError::MissingToken,
            }),
        );
        assert!(!summary.is_success());
        assert_eq!(summary.completed(), 3);

        summary.record(
            22,
            Err(UnitError::Auth(CloudError::MissingConfig("OS_AUTH_URL"))),
        );
        summary.sort();

        assert_eq!(summary.completed(), 4);
        assert_eq!(summary.created[0].unit.index, 20);
        assert_eq!(summary.failures[0].0, 22);
        assert_eq!(summary.count_kind("auth"), 1);
        assert_eq!(summary.count_kind("orphaned"), 1);
        assert_eq!(summary.count_kind("skipped"), 0);
        assert_eq!(summary.orphaned_networks(), vec![(23, "net-23")]);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_all_created_is_success() {
        let mut summary = Summary::new(2);
        summary.record(20, Ok(provisioned(20)));
        summary.record(21, Ok(provisioned(21)));
        assert!(summary.is_success());
        assert!(summary.orphaned_networks().is_empty());
    }
}
