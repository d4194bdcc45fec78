//! OpenStack control-plane access.
//!
//! - [`auth`] - Keystone v3 token and service catalog handling
//! - [`network`] - Neutron network and subnet creation
//!
//! The provisioner only sees the [`Connector`] and [`NetworkApi`] traits, so
//! each unit gets its own session and tests can swap in an in-memory cloud.

pub mod auth;
pub mod network;

use crate::config::{CloudConfig, HTTP_TIMEOUT_SECS};
use crate::error::CloudError;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use network::{Network, OpenStackSession, Subnet, SubnetRequest};

/// Opens an authenticated session against the cloud.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Session: NetworkApi;

    async fn connect(&self) -> Result<Self::Session, CloudError>;
}

/// The two mutations the provisioner issues.
#[allow(async_fn_in_trait)]
pub trait NetworkApi {
    async fn create_network(&self, name: &str) -> Result<Network, CloudError>;

    async fn create_subnet(&self, request: &SubnetRequest) -> Result<Subnet, CloudError>;
}

/// Connects to the real cloud over HTTP.
///
/// Without an explicit config, every `connect()` reads the environment and
/// `clouds.yaml` again, so a broken setup fails each unit at its connect step.
#[derive(Debug, Clone, Default)]
pub struct OpenStackConnector {
    config: Option<CloudConfig>,
}

impl OpenStackConnector {
    pub fn with_config(config: CloudConfig) -> OpenStackConnector {
        OpenStackConnector {
            config: Some(config),
        }
    }
}

impl Connector for OpenStackConnector {
    type Session = OpenStackSession;

    async fn connect(&self) -> Result<OpenStackSession, CloudError> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => CloudConfig::from_env()?,
        };

        // One client per session: no connection pool is shared between units.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        let token = auth::authenticate(&http, &config).await?;
        Ok(OpenStackSession::new(http, token))
    }
}

/// Turn a non-2xx response into [`CloudError::Status`], otherwise return the body.
pub(crate) async fn response_text(
    method: &'static str,
    url: &str,
    response: reqwest::Response,
) -> Result<String, CloudError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        log::debug!("{method} {url} -> {status} body={body}");
        return Err(CloudError::Status {
            method,
            url: url.to_string(),
            status: status.as_u16(),
            body: body.trim().to_string(),
        });
    }
    log::trace!("{method} {url} -> {status} len={}", body.len());
    Ok(body)
}

/// Decode a JSON body, reporting the failing path.
pub(crate) fn decode<T: DeserializeOwned>(context: &'static str, body: &str) -> Result<T, CloudError> {
    let mut deserializer = serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", body);
        CloudError::Decode {
            context,
            path: e.path().to_string(),
            message: e.inner().to_string(),
        }
    })
}

/// Serialize a request body.
pub(crate) fn encode<T: serde::Serialize>(context: &'static str, value: &T) -> Result<Vec<u8>, CloudError> {
    serde_json::to_vec(value).map_err(|source| CloudError::Encode { context, source })
}
