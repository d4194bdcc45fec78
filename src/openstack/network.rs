//! Neutron v2.0 network and subnet creation.

use super::auth::AuthToken;
use super::{decode, encode, response_text, NetworkApi};
use crate::error::CloudError;
use crate::models::Ipv4;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const API_VERSION_SUFFIX: &str = "/v2.0";

/// A created Neutron network.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// A created Neutron subnet.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub cidr: Ipv4,
    pub ip_version: u8,
    #[serde(default)]
    pub gateway_ip: Option<String>,
}

/// Body of a create-subnet call.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetRequest {
    pub name: String,
    pub network_id: String,
    pub ip_version: u8,
    pub cidr: Ipv4,
}

#[derive(Serialize, Debug)]
struct NewNetwork<'a> {
    name: &'a str,
    admin_state_up: bool,
}

#[derive(Serialize, Debug)]
struct CreateNetworkBody<'a> {
    network: NewNetwork<'a>,
}

#[derive(Serialize, Debug)]
struct CreateSubnetBody<'a> {
    subnet: &'a SubnetRequest,
}

#[derive(Deserialize, Debug)]
struct NetworkResponse {
    network: Network,
}

#[derive(Deserialize, Debug)]
struct SubnetResponse {
    subnet: Subnet,
}

/// Versioned base URL for a catalog `network` endpoint.
pub fn network_base_url(endpoint: &str) -> String {
    let base = endpoint.trim().trim_end_matches('/');
    if base.ends_with(API_VERSION_SUFFIX) {
        base.to_string()
    } else {
        format!("{base}{API_VERSION_SUFFIX}")
    }
}

/// An authenticated session bound to one Neutron endpoint.
///
/// Owns its HTTP client; dropping the session releases its connections.
#[derive(Debug)]
pub struct OpenStackSession {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl OpenStackSession {
    pub fn new(http: reqwest::Client, auth: AuthToken) -> OpenStackSession {
        OpenStackSession {
            http,
            base_url: network_base_url(&auth.network_endpoint),
            token: auth.token,
        }
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> Result<String, CloudError> {
        let url = format!("{}/{path}", self.base_url);
        log::debug!("POST {url}");
        let response = self
            .http
            .post(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        response_text("POST", &url, response).await
    }
}

impl NetworkApi for OpenStackSession {
    async fn create_network(&self, name: &str) -> Result<Network, CloudError> {
        let body = encode(
            "network request",
            &CreateNetworkBody {
                network: NewNetwork {
                    name,
                    admin_state_up: true,
                },
            },
        )?;
        let text = self.post("networks", body).await?;
        network_from_created(name, &text)
    }

    async fn create_subnet(&self, request: &SubnetRequest) -> Result<Subnet, CloudError> {
        let body = encode("subnet request", &CreateSubnetBody { subnet: request })?;
        let text = self.post("subnets", body).await?;
        subnet_from_created(request, &text)
    }
}

/// `body[resource]["id"]`, if present.
fn created_id(text: &str, resource: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get(resource)?.get("id")?.as_str().map(str::to_string)
}

/// Read a 2xx create-network body.
///
/// The network exists once Neutron answered 2xx, so a body that does not
/// fully decode still yields a [`Network`] as long as it carries an id.
fn network_from_created(name: &str, text: &str) -> Result<Network, CloudError> {
    match decode::<NetworkResponse>("network response", text) {
        Ok(parsed) => Ok(parsed.network),
        Err(e) => match created_id(text, "network") {
            Some(id) => {
                log::warn!("Network {name} created as {id} but response incomplete: {e}");
                Ok(Network {
                    id,
                    name: name.to_string(),
                    status: None,
                })
            }
            None => Err(CloudError::Unreadable {
                context: "network response",
                message: e.to_string(),
            }),
        },
    }
}

/// Read a 2xx create-subnet body, falling back to the request for anything
/// but the id.
fn subnet_from_created(request: &SubnetRequest, text: &str) -> Result<Subnet, CloudError> {
    match decode::<SubnetResponse>("subnet response", text) {
        Ok(parsed) => Ok(parsed.subnet),
        Err(e) => match created_id(text, "subnet") {
            Some(id) => {
                log::warn!(
                    "Subnet {} created as {id} but response incomplete: {e}",
                    request.name
                );
                Ok(Subnet {
                    id,
                    name: request.name.clone(),
                    network_id: request.network_id.clone(),
                    cidr: request.cidr,
                    ip_version: request.ip_version,
                    gateway_ip: None,
                })
            }
            None => Err(CloudError::Unreadable {
                context: "subnet response",
                message: e.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_network_base_url() {
        assert_eq!(
            network_base_url("http://neutron:9696"),
            "http://neutron:9696/v2.0"
        );
        assert_eq!(
            network_base_url("http://neutron:9696/"),
            "http://neutron:9696/v2.0"
        );
        assert_eq!(
            network_base_url("https://cloud.example/network/v2.0/"),
            "https://cloud.example/network/v2.0"
        );
    }

    #[test]
    fn test_session_base_url_from_token() {
        let session = OpenStackSession::new(
            reqwest::Client::new(),
            AuthToken {
                token: "gAAAA".to_string(),
                network_endpoint: "http://neutron:9696/".to_string(),
                expires_at: None,
            },
        );
        assert_eq!(session.base_url, "http://neutron:9696/v2.0");
    }

    #[test]
    fn test_create_network_body() {
        let value = serde_json::to_value(CreateNetworkBody {
            network: NewNetwork {
                name: "spawn_network-20",
                admin_state_up: true,
            },
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"network": {"name": "spawn_network-20", "admin_state_up": true}})
        );
    }

    #[test]
    fn test_create_subnet_body() {
        let request = SubnetRequest {
            name: "spawn_subnet-spawn_network-300".to_string(),
            network_id: "4e8e5957-649f-477b-9e5b-f1f75b21c03c".to_string(),
            ip_version: 4,
            cidr: "192.169.44.0/24".parse().unwrap(),
        };
        let value = serde_json::to_value(CreateSubnetBody { subnet: &request }).unwrap();
        assert_eq!(
            value,
            json!({
                "subnet": {
                    "name": "spawn_subnet-spawn_network-300",
                    "network_id": "4e8e5957-649f-477b-9e5b-f1f75b21c03c",
                    "ip_version": 4,
                    "cidr": "192.169.44.0/24"
                }
            })
        );
    }

    #[test]
    fn test_parse_network_response() {
        let text = r#"{
            "network": {
                "admin_state_up": true,
                "id": "4e8e5957-649f-477b-9e5b-f1f75b21c03c",
                "name": "spawn_network-20",
                "shared": false,
                "status": "ACTIVE",
                "subnets": [],
                "tenant_id": "9bacb3c5d39d41a79512987f338cf177"
            }
        }"#;
        let parsed: NetworkResponse = decode("network response", text).unwrap();
        assert_eq!(parsed.network.id, "4e8e5957-649f-477b-9e5b-f1f75b21c03c");
        assert_eq!(parsed.network.status.as_deref(), Some("ACTIVE"));
    }

    #[test]
    fn test_parse_subnet_response() {
        let text = r#"{
            "subnet": {
                "name": "spawn_subnet-spawn_network-20",
                "enable_dhcp": true,
                "network_id": "4e8e5957-649f-477b-9e5b-f1f75b21c03c",
                "id": "3b80198d-4f7b-4f77-9ef5-774d54e17126",
                "ip_version": 4,
                "cidr": "192.168.20.0/24",
                "gateway_ip": "192.168.20.1",
                "allocation_pools": [{"start": "192.168.20.2", "end": "192.168.20.254"}]
            }
        }"#;
        let parsed: SubnetResponse = decode("subnet response", text).unwrap();
        assert_eq!(parsed.subnet.cidr, "192.168.20.0/24".parse::<Ipv4>().unwrap());
        assert_eq!(parsed.subnet.gateway_ip.as_deref(), Some("192.168.20.1"));
    }

    #[test]
    fn test_parse_subnet_response_bad_cidr() {
        let text = r#"{"subnet": {"id": "x", "name": "y", "network_id": "z", "ip_version": 4, "cidr": "nope"}}"#;
        let err = decode::<SubnetResponse>("subnet response", text).unwrap_err();
        match err {
            CloudError::Decode { path, .. } => assert_eq!(path, "subnet.cidr"),
            other => panic!("Expected Decode error, got {other:?}"),
        }
    }

    fn subnet_request() -> SubnetRequest {
        SubnetRequest {
            name: "spawn_subnet-spawn_network-20".to_string(),
            network_id: "4e8e5957".to_string(),
            ip_version: 4,
            cidr: "192.168.20.0/24".parse().unwrap(),
        }
    }

    #[test]
    fn test_created_network_with_odd_body_keeps_id() {
        // `name` is not a string, the network was still created.
        let text = r#"{"network": {"id": "4e8e5957", "name": 20, "status": "BUILD"}}"#;
        let network = network_from_created("spawn_network-20", text).unwrap();
        assert_eq!(
            network,
            Network {
                id: "4e8e5957".to_string(),
                name: "spawn_network-20".to_string(),
                status: None,
            }
        );
    }

    #[test]
    fn test_created_network_without_id_is_unreadable() {
        for text in ["", "<html>OK</html>", r#"{"network": {"name": "x"}}"#] {
            let err = network_from_created("spawn_network-20", text).unwrap_err();
            assert!(
                matches!(err, CloudError::Unreadable { context: "network response", .. }),
                "Expected Unreadable for {text:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_created_subnet_with_odd_body_keeps_id() {
        let text = r#"{"subnet": {"id": "3b80198d", "cidr": "nope"}}"#;
        let subnet = subnet_from_created(&subnet_request(), text).unwrap();
        assert_eq!(subnet.id, "3b80198d");
        assert_eq!(subnet.network_id, "4e8e5957");
        assert_eq!(subnet.cidr.to_string(), "192.168.20.0/24");
    }

    #[test]
    fn test_created_subnet_without_id_is_unreadable() {
        let err = subnet_from_created(&subnet_request(), "{}").unwrap_err();
        assert!(matches!(err, CloudError::Unreadable { context: "subnet response", .. }));
    }
}
