use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Assets manifest written by the build pipeline next to the server bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsManifest {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryAsset>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub routes: BTreeMap<String, RouteAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAsset {
    pub module: String,
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAsset {
    pub id: String,
    #[serde(default)]
    pub path: Option<String>,
    pub module: String,
}

impl AssetsManifest {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            url: None,
            entry: None,
            routes: BTreeMap::new(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// A server bundle that has been built and loaded into the running process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerBuild {
    pub assets: AssetsManifest,
}

impl ServerBuild {
    pub fn new(assets: AssetsManifest) -> Self {
        Self { assets }
    }

    /// Opaque hash distinguishing this build from the previous one.
    pub fn version(&self) -> &str {
        &self.assets.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingPayload {
    pub build_hash: String,
}

impl From<&ServerBuild> for PingPayload {
    fn from(build: &ServerBuild) -> Self {
        Self {
            build_hash: build.version().to_string(),
        }
    }
}
