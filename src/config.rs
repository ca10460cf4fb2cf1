use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    genre::Genre,
    source::http::{ConfigBuilder, Deployment},
};

/// Settings file of the `ranking` command
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Base URL of the ranking API. Defaults to the local deployment.
    pub base_url: Option<Url>,
    /// Per-request timeout.
    pub timeout_secs: Option<u64>,
    /// Retries of transient failures per page.
    pub max_retries: Option<u32>,
    /// Genre listed when none is given on the command line.
    pub genre: Option<Genre>,
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// HTTP source config described by these settings
    pub fn config_builder(&self) -> ConfigBuilder {
        let mut builder = ConfigBuilder::new(Deployment::Local);
        if let Some(base_url) = &self.base_url {
            builder.base_url(base_url.clone());
        }
        if let Some(timeout_secs) = self.timeout_secs {
            builder.timeout(Duration::from_secs(timeout_secs));
        }
        if let Some(max_retries) = self.max_retries {
            builder.max_retries(max_retries);
        }
        builder
    }
}
