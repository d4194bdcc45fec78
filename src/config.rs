//! Run constants and cloud connection settings.
//!
//! The run itself is fixed at compile time. Cloud credentials follow the
//! usual OpenStack conventions: a named cloud from `clouds.yaml` selected by
//! `OS_CLOUD`, with any `OS_*` environment variable taking precedence over the
//! file. The environment may be supplied by a `.env` file loaded in `main`.

use crate::error::CloudError;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Number of network/subnet pairs created per run.
pub const NUM_NETWORKS: u32 = 2005;
/// First index of the run.
pub const START_NUM: u32 = 20;
/// Per-request HTTP timeout.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

const DEFAULT_DOMAIN: &str = "Default";
const DEFAULT_INTERFACE: &str = "public";
const CLOUDS_YAML: &str = "clouds.yaml";
const SYSTEM_CONFIG_DIR: &str = "/etc/openstack";

/// How a session authenticates against Keystone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Password {
        username: String,
        password: String,
        user_domain: DomainRef,
        project: ProjectScope,
    },
    ApplicationCredential {
        id: String,
        secret: String,
    },
}

/// A Keystone domain, by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRef {
    Id(String),
    Name(String),
}

/// Project a password token is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectScope {
    Id(String),
    Name { name: String, domain: DomainRef },
}

/// Everything needed to open a session against the cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    pub auth_url: String,
    pub auth: AuthMethod,
    pub region_name: Option<String>,
    pub interface: String,
}

#[derive(Deserialize, Debug, Default)]
struct CloudsFile {
    #[serde(default)]
    clouds: HashMap<String, CloudEntry>,
}

/// One named cloud in `clouds.yaml`.
#[derive(Deserialize, Debug, Default, Clone)]
struct CloudEntry {
    #[serde(default)]
    auth: CloudAuth,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    interface: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
struct CloudAuth {
    auth_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    project_id: Option<String>,
    project_name: Option<String>,
    user_domain_id: Option<String>,
    user_domain_name: Option<String>,
    project_domain_id: Option<String>,
    project_domain_name: Option<String>,
    application_credential_id: Option<String>,
    application_credential_secret: Option<String>,
}

impl CloudEntry {
    /// The value this entry holds for an `OS_*` variable.
    fn get(&self, key: &str) -> Option<&str> {
        let auth = &self.auth;
        let value = match key {
            "OS_AUTH_URL" => &auth.auth_url,
            "OS_USERNAME" => &auth.username,
            "OS_PASSWORD" => &auth.password,
            "OS_PROJECT_ID" => &auth.project_id,
            "OS_PROJECT_NAME" => &auth.project_name,
            "OS_USER_DOMAIN_ID" => &auth.user_domain_id,
            "OS_USER_DOMAIN_NAME" => &auth.user_domain_name,
            "OS_PROJECT_DOMAIN_ID" => &auth.project_domain_id,
            "OS_PROJECT_DOMAIN_NAME" => &auth.project_domain_name,
            "OS_APPLICATION_CREDENTIAL_ID" => &auth.application_credential_id,
            "OS_APPLICATION_CREDENTIAL_SECRET" => &auth.application_credential_secret,
            "OS_REGION_NAME" => &self.region_name,
            "OS_INTERFACE" => &self.interface,
            _ => return None,
        };
        value.as_deref()
    }
}

/// Pick cloud `name` out of a `clouds.yaml` document.
fn parse_cloud(text: &str, name: &str, path: &str) -> Result<CloudEntry, CloudError> {
    let file: CloudsFile = serde_yaml_ng::from_str(text).map_err(|e| CloudError::CloudsFile {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    file.clouds
        .get(name)
        .cloned()
        .ok_or_else(|| CloudError::UnknownCloud {
            cloud: name.to_string(),
            path: path.to_string(),
        })
}

/// Where `clouds.yaml` is looked for, in order.
fn clouds_yaml_paths<F>(get: F) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let mut paths = Vec::new();
    if let Some(file) = get("OS_CLIENT_CONFIG_FILE") {
        paths.push(PathBuf::from(file));
    }
    paths.push(PathBuf::from(CLOUDS_YAML));
    let user_dir = get("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| get("HOME").map(|home| PathBuf::from(home).join(".config")));
    if let Some(dir) = user_dir {
        paths.push(dir.join("openstack").join(CLOUDS_YAML));
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG_DIR).join(CLOUDS_YAML));
    paths
}

fn load_cloud<F>(name: &str, get: F) -> Result<CloudEntry, CloudError>
where
    F: Fn(&str) -> Option<String>,
{
    let paths = clouds_yaml_paths(get);
    let path = paths.iter().find(|p| p.is_file()).ok_or_else(|| {
        CloudError::CloudsFileNotFound {
            cloud: name.to_string(),
            searched: paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    })?;
    let path = path.display().to_string();
    log::debug!("Reading cloud '{name}' from {path}");
    let text = fs::read_to_string(&path).map_err(|e| CloudError::CloudsFile {
        path: path.clone(),
        message: e.to_string(),
    })?;
    parse_cloud(&text, name, &path)
}

impl CloudConfig {
    /// Read the configuration from the process environment and `clouds.yaml`.
    pub fn from_env() -> Result<CloudConfig, CloudError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, empty values count as unset.
    ///
    /// With `OS_CLOUD` set, the named cloud from the first `clouds.yaml` found
    /// fills in every `OS_*` value the lookup does not provide.
    pub fn from_lookup<F>(lookup: F) -> Result<CloudConfig, CloudError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let cloud = match env("OS_CLOUD") {
            Some(name) => Some(load_cloud(&name, env)?),
            None => None,
        };
        Self::resolve(|key| {
            env(key).or_else(|| {
                cloud
                    .as_ref()
                    .and_then(|c| c.get(key))
                    .filter(|v| !v.trim().is_empty())
                    .map(str::to_string)
            })
        })
    }

    fn resolve<F>(get: F) -> Result<CloudConfig, CloudError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| get(key).ok_or(CloudError::MissingConfig(key));
        let domain = |id_key: &str, name_key: &str| match get(id_key) {
            Some(id) => DomainRef::Id(id),
            None => DomainRef::Name(get(name_key).unwrap_or_else(|| DEFAULT_DOMAIN.to_string())),
        };

        let auth_url = require("OS_AUTH_URL")?;

        let auth = match get("OS_APPLICATION_CREDENTIAL_ID") {
            Some(id) => AuthMethod::ApplicationCredential {
                id,
                secret: require("OS_APPLICATION_CREDENTIAL_SECRET")?,
            },
            None => {
                let project = match get("OS_PROJECT_ID") {
                    Some(id) => ProjectScope::Id(id),
                    None => ProjectScope::Name {
                        name: require("OS_PROJECT_NAME")?,
                        domain: domain("OS_PROJECT_DOMAIN_ID", "OS_PROJECT_DOMAIN_NAME"),
                    },
                };
                AuthMethod::Password {
                    username: require("OS_USERNAME")?,
                    password: require("OS_PASSWORD")?,
                    user_domain: domain("OS_USER_DOMAIN_ID", "OS_USER_DOMAIN_NAME"),
                    project,
                }
            }
        };

        let config = CloudConfig {
            auth_url,
            auth,
            region_name: get("OS_REGION_NAME"),
            interface: get("OS_INTERFACE").unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
        };
        log::debug!(
            "CloudConfig auth_url={} region={:?} interface={}",
            config.auth_url,
            config.region_name,
            config.interface
        );
        Ok(config)
    }
}
