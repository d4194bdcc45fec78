//! Keystone v3 authentication.
//!
//! A token is requested with `POST /v3/auth/tokens`; Keystone returns the
//! token itself in the `X-Subject-Token` header and the service catalog in
//! the body. The catalog is where the Neutron endpoint comes from.

use super::{decode, encode, response_text};
use crate::config::{AuthMethod, CloudConfig, DomainRef, ProjectScope};
use crate::error::CloudError;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
const NETWORK_SERVICE_TYPE: &str = "network";

/// A scoped token plus the endpoint it is used against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub network_endpoint: String,
    pub expires_at: Option<String>,
}

#[derive(Serialize, Debug)]
struct AuthRequest<'a> {
    auth: Auth<'a>,
}

#[derive(Serialize, Debug)]
struct Auth<'a> {
    identity: Identity<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<Scope<'a>>,
}

#[derive(Serialize, Debug)]
struct Identity<'a> {
    methods: [&'static str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<PasswordIdentity<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    application_credential: Option<ApplicationCredential<'a>>,
}

#[derive(Serialize, Debug)]
struct PasswordIdentity<'a> {
    user: User<'a>,
}

#[derive(Serialize, Debug)]
struct User<'a> {
    name: &'a str,
    domain: Domain<'a>,
    password: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum Domain<'a> {
    Id { id: &'a str },
    Name { name: &'a str },
}

impl<'a> From<&'a DomainRef> for Domain<'a> {
    fn from(domain: &'a DomainRef) -> Domain<'a> {
        match domain {
            DomainRef::Id(id) => Domain::Id { id: id.as_str() },
            DomainRef::Name(name) => Domain::Name { name: name.as_str() },
        }
    }
}

#[derive(Serialize, Debug)]
struct ApplicationCredential<'a> {
    id: &'a str,
    secret: &'a str,
}

#[derive(Serialize, Debug)]
struct Scope<'a> {
    project: Project<'a>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum Project<'a> {
    Id { id: &'a str },
    Name { name: &'a str, domain: Domain<'a> },
}

impl<'a> AuthRequest<'a> {
    fn new(method: &'a AuthMethod) -> AuthRequest<'a> {
        let (identity, scope) = match method {
            AuthMethod::Password {
                username,
                password,
                user_domain,
                project,
            } => {
                let project = match project {
                    ProjectScope::Id(id) => Project::Id { id: id.as_str() },
                    ProjectScope::Name { name, domain } => Project::Name {
                        name: name.as_str(),
                        domain: domain.into(),
                    },
                };
                let identity = Identity {
                    methods: ["password"],
                    password: Some(PasswordIdentity {
                        user: User {
                            name: username.as_str(),
                            domain: user_domain.into(),
                            password: password.as_str(),
                        },
                    }),
                    application_credential: None,
                };
                (identity, Some(Scope { project }))
            }
            // Application credentials carry their own project scope.
            AuthMethod::ApplicationCredential { id, secret } => (
                Identity {
                    methods: ["application_credential"],
                    password: None,
                    application_credential: Some(ApplicationCredential {
                        id: id.as_str(),
                        secret: secret.as_str(),
                    }),
                },
                None,
            ),
        };
        AuthRequest {
            auth: Auth { identity, scope },
        }
    }
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Deserialize, Debug)]
struct TokenBody {
    #[serde(default)]
    expires_at: Option<String>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

/// One service in the token's service catalog.
#[derive(Deserialize, Debug, Clone)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Endpoint {
    pub interface: String,
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub url: String,
}

impl Endpoint {
    fn in_region(&self, region: Option<&str>) -> bool {
        match region {
            None => true,
            Some(r) => self.region_id.as_deref() == Some(r) || self.region.as_deref() == Some(r),
        }
    }
}

/// Keystone token URL for an `OS_AUTH_URL` with or without the `/v3` suffix.
pub fn token_url(auth_url: &str) -> String {
    let base = auth_url.trim().trim_end_matches('/');
    if base.ends_with("/v3") {
        format!("{base}/auth/tokens")
    } else {
        format!("{base}/v3/auth/tokens")
    }
}

/// Pick the endpoint URL for `service_type` from a service catalog.
pub fn find_endpoint(
    catalog: &[CatalogEntry],
    service_type: &str,
    interface: &str,
    region: Option<&str>,
) -> Result<String, CloudError> {
    catalog
        .iter()
        .filter(|entry| entry.service_type == service_type)
        .flat_map(|entry| entry.endpoints.iter())
        .find(|ep| ep.interface == interface && ep.in_region(region))
        .map(|ep| ep.url.clone())
        .ok_or_else(|| CloudError::EndpointNotFound {
            service_type: service_type.to_string(),
            interface: interface.to_string(),
            region: region.map(str::to_string),
        })
}

/// Request a token and resolve the network endpoint from its catalog.
pub async fn authenticate(
    http: &reqwest::Client,
    config: &CloudConfig,
) -> Result<AuthToken, CloudError> {
    let url = token_url(&config.auth_url);
    let parsed = reqwest::Url::parse(&url).map_err(|e| CloudError::InvalidUrl {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    let body = encode("token request", &AuthRequest::new(&config.auth))?;
    log::debug!("POST {url}");
    let response = http
        .post(parsed)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let token = response
        .headers()
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = response_text("POST", &url, response).await?;
    let token = token.ok_or(CloudError::MissingToken)?;

    let parsed: TokenResponse = decode("token response", &text)?;
    let network_endpoint = find_endpoint(
        &parsed.token.catalog,
        NETWORK_SERVICE_TYPE,
        &config.interface,
        config.region_name.as_deref(),
    )?;
    log::debug!(
        "Got token expires_at={:?} network_endpoint={network_endpoint}",
        parsed.token.expires_at
    );

    Ok(AuthToken {
        token,
        network_endpoint,
        expires_at: parsed.token.expires_at,
    })
}
