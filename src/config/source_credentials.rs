use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

use crate::types::AccessKeys;
use crate::types::error::MigrateError;

/// Source-side connection settings read from the `--source-config` YAML file.
///
/// ```yaml
/// AWS_ACCESS_KEY_ID: ...
/// AWS_SECRET_ACCESS_KEY: ...
/// AWS_REGION: us-east-1
/// AWS_ENDPOINT_URL: https://swift.example.org
/// FORCE_PATH_STYLE: true
/// ```
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SourceCredentials {
    #[serde(rename = "AWS_ACCESS_KEY_ID")]
    pub access_key: String,
    #[serde(rename = "AWS_SECRET_ACCESS_KEY")]
    pub secret_access_key: String,
    #[serde(rename = "AWS_SESSION_TOKEN", default)]
    pub session_token: Option<String>,
    #[serde(rename = "AWS_REGION", default)]
    pub region: Option<String>,
    #[serde(rename = "AWS_ENDPOINT_URL", default)]
    pub endpoint_url: Option<String>,
    #[serde(rename = "FORCE_PATH_STYLE", default)]
    pub force_path_style: bool,
}

impl SourceCredentials {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow!(MigrateError::Config(format!(
                "failed to read source config {}: {e}",
                path.display()
            )))
        })?;

        Self::parse(&content).map_err(|e| {
            anyhow!(MigrateError::Config(format!(
                "invalid source config {}: {e:#}",
                path.display()
            )))
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let credentials: SourceCredentials =
            serde_yaml::from_str(content).context("serde_yaml::from_str() failed.")?;

        if credentials.access_key.is_empty() || credentials.secret_access_key.is_empty() {
            return Err(anyhow!(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must not be empty"
            ));
        }

        Ok(credentials)
    }

    pub fn access_keys(&self) -> AccessKeys {
        AccessKeys {
            access_key: self.access_key.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: self.session_token.clone(),
        }
    }
}

impl Debug for SourceCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceCredentials")
            .field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}
