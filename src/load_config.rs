/// `load_config` module: Loads the static YAML config and injects secrets from the environment.
///
/// This is the only place where the user-supplied config file is parsed and mapped
/// to the strongly-typed [`ClientConfig`] the HTTP client is built from.
///
/// # Responsibilities
/// - Parse the YAML config file (account email, channel username, developer key, endpoints)
/// - Inject secrets from the environment: `YTPA_PASSWORD` (required) and
///   `YTPA_DEVELOPER_KEY` (overrides the file's `developer_key`)
/// - Fill in default endpoints when the file leaves them out
///
/// # Errors
/// All errors use `anyhow::Error` and name the offending file or variable.
///
/// Example file:
///
/// ```yaml
/// email: someone@example.com
/// username: someone
/// developer_key: AI39si...
/// default_destination: Everything
/// ```
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info};

use crate::client::{ClientConfig, DEFAULT_API_BASE, DEFAULT_CLIENT_SOURCE, DEFAULT_LOGIN_URL};

pub const PASSWORD_VAR: &str = "YTPA_PASSWORD";
pub const DEVELOPER_KEY_VAR: &str = "YTPA_DEVELOPER_KEY";

#[derive(Debug, Deserialize)]
struct RawConfig {
    email: String,
    username: String,
    #[serde(default)]
    developer_key: Option<String>,
    #[serde(default)]
    default_destination: Option<String>,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    login_url: Option<String>,
    #[serde(default)]
    client_source: Option<String>,
}

/// Fully merged configuration for one CLI invocation.
pub struct CliConfig {
    pub client: ClientConfig,
    pub password: String,
    /// Destination used when none is given on the command line.
    pub default_destination: Option<String>,
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("client", &self.client)
            .field("password", &"<redacted>")
            .field("default_destination", &self.default_destination)
            .finish()
    }
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let password = match std::env::var(PASSWORD_VAR) {
        Ok(password) if !password.is_empty() => password,
        _ => {
            error!(var = PASSWORD_VAR, "Account password not set in environment");
            anyhow::bail!("{PASSWORD_VAR} environment variable not set");
        }
    };

    let developer_key = match std::env::var(DEVELOPER_KEY_VAR) {
        Ok(key) if !key.is_empty() => {
            info!(var = DEVELOPER_KEY_VAR, "Developer key taken from environment");
            key
        }
        _ => match raw.developer_key {
            Some(key) if !key.is_empty() => key,
            _ => {
                error!(config_path = ?path_ref, "No developer key configured");
                anyhow::bail!(
                    "No developer key: set developer_key in {:?} or {DEVELOPER_KEY_VAR}",
                    path_ref
                );
            }
        },
    };

    let client = ClientConfig {
        developer_key,
        email: raw.email,
        username: raw.username,
        api_base: raw.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        login_url: raw.login_url.unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
        client_source: raw
            .client_source
            .unwrap_or_else(|| DEFAULT_CLIENT_SOURCE.to_string()),
    };

    info!(
        username = %client.username,
        api_base = %client.api_base,
        default_destination = ?raw.default_destination,
        "Config loaded and merged successfully"
    );

    Ok(CliConfig {
        client,
        password,
        default_destination: raw.default_destination,
    })
}
