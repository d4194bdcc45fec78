//! Error types for cloud calls and per-unit provisioning.

use thiserror::Error;

/// Stands in for the id of a resource that exists but could not be read back.
pub const UNKNOWN_ID: &str = "unknown";

/// Failure talking to the cloud control plane.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("missing cloud configuration: {0} is not set")]
    MissingConfig(&'static str),

    #[error("OS_CLOUD={cloud} but no clouds.yaml found (searched {searched})")]
    CloudsFileNotFound { cloud: String, searched: String },

    #[error("Error reading {path}: {message}")]
    CloudsFile { path: String, message: String },

    #[error("cloud '{cloud}' is not defined in {path}")]
    UnknownCloud { cloud: String, path: String },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Error parsing {context}: path={path} error={message}")]
    Decode {
        context: &'static str,
        path: String,
        message: String,
    },

    /// The call succeeded but its body has no usable id.
    #[error("{context} accepted but unreadable: {message}")]
    Unreadable {
        context: &'static str,
        message: String,
    },

    #[error("Error serializing {context}: {source}")]
    Encode {
        context: &'static str,
        source: serde_json::Error,
    },

    #[error("token response has no X-Subject-Token header")]
    MissingToken,

    #[error("no '{service_type}' endpoint for interface '{interface}' in region {region:?}")]
    EndpointNotFound {
        service_type: String,
        interface: String,
        region: Option<String>,
    },
}

/// Why a single network unit was not fully provisioned.
///
/// Only [`UnitError::CreateSubnetFailed`] leaves anything behind in the cloud.
/// Its `network_id` is [`UNKNOWN_ID`] when the network was created but its id
/// could not be read back.
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("Error connecting to OpenStack: {0}")]
    Auth(#[source] CloudError),

    #[error("Skipping {network_name}: IP address range exceeded (second octet {octet_2} > 255)")]
    RangeExhausted {
        index: u32,
        network_name: String,
        octet_2: u32,
    },

    #[error("creating network {network_name} failed: {source}")]
    CreateNetworkFailed {
        network_name: String,
        source: CloudError,
    },

    #[error("subnet for {network_name} not created, network {network_id} left orphaned: {source}")]
    CreateSubnetFailed {
        network_name: String,
        network_id: String,
        source: CloudError,
    },
}

impl UnitError {
    /// Short tag for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            UnitError::Auth(_) => "auth",
            UnitError::RangeExhausted { .. } => "skipped",
            UnitError::CreateNetworkFailed { .. } => "network",
            UnitError::CreateSubnetFailed { .. } => "orphaned",
        }
    }

    /// Id of a network that was created but has no subnet.
    pub fn orphaned_network_id(&self) -> Option<&str> {
        match self {
            UnitError::CreateSubnetFailed { network_id, .. } => Some(network_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_exhausted_message() {
        let err = UnitError::RangeExhausted {
            index: 22528,
            network_name: "spawn_network-22528".to_string(),
            octet_2: 256,
        };
        assert_eq!(
            err.to_string(),
            "Skipping spawn_network-22528: IP address range exceeded (second octet 256 > 255)"
        );
        assert_eq!(err.kind(), "skipped");
        assert_eq!(err.orphaned_network_id(), None);
    }

    #[test]
    fn test_orphaned_network_id() {
        let err = UnitError::CreateSubnetFailed {
            network_name: "spawn_network-20".to_string(),
            network_id: "net-1".to_string(),
            source: CloudError::Status {
                method: "POST",
                url: "http://neutron/v2.0/subnets".to_string(),
                status: 409,
                body: "conflict".to_string(),
            },
        };
        assert_eq!(err.kind(), "orphaned");
        assert_eq!(err.orphaned_network_id(), Some("net-1"));
        assert!(err.to_string().contains("returned 409: conflict"));
    }

    #[test]
    fn test_unreadable_network_is_still_orphaned() {
        let err = UnitError::CreateSubnetFailed {
            network_name: "spawn_network-20".to_string(),
            network_id: UNKNOWN_ID.to_string(),
            source: CloudError::Unreadable {
                context: "network response",
                message: "no network.id in body".to_string(),
            },
        };
        assert_eq!(err.kind(), "orphaned");
        assert_eq!(err.orphaned_network_id(), Some("unknown"));
        assert_eq!(
            err.to_string(),
            "subnet for spawn_network-20 not created, network unknown left orphaned: \
             network response accepted but unreadable: no network.id in body"
        );
    }

    #[test]
    fn test_auth_message() {
        let err = UnitError::Auth(CloudError::MissingConfig("OS_AUTH_URL"));
        assert_eq!(
            err.to_string(),
            "Error connecting to OpenStack: missing cloud configuration: OS_AUTH_URL is not set"
        );
    }
}
