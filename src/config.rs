use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::encoding::parse_address;
use crate::hash::Domain;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRaw {
    pub chain_id: u64,
    pub entry_point: String,
    #[serde(default)]
    pub factory: Option<String>,
}

/// The single network this process signs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub chain_id: u64,
    pub entry_point: ethers::types::Address,
    pub factory: Option<ethers::types::Address>,
}

impl Network {
    pub fn domain(&self) -> Domain {
        Domain::new(self.entry_point, self.chain_id)
    }
}

pub fn load_network(path: &Path, entry_point_override: Option<&str>) -> Result<Network> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read network json at {}", path.display()))?;
    parse_network(&raw, entry_point_override)
        .with_context(|| format!("invalid network json at {}", path.display()))
}

pub fn parse_network(raw: &str, entry_point_override: Option<&str>) -> Result<Network> {
    let raw: NetworkRaw = serde_json::from_str(raw).context("failed to parse network json")?;

    let entry_point = entry_point_override.unwrap_or(&raw.entry_point);
    let entry_point = parse_address(entry_point).context("invalid entryPoint address")?;
    let factory = raw
        .factory
        .as_deref()
        .map(parse_address)
        .transpose()
        .context("invalid factory address")?;

    Ok(Network {
        chain_id: raw.chain_id,
        entry_point,
        factory,
    })
}
