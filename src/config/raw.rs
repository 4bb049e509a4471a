/*!
 * Configuration File Format
 * Serde mirror of the TOML file before validation
 */

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(super) struct RawConfig {
    pub mountpoint: Option<PathBuf>,
    pub branches: Vec<RawGroup>,
    pub min_free_space: Option<RawSize>,
    pub link_exdev: Option<String>,
    pub inodecalc: Option<String>,
    pub readdir: Option<String>,
    pub broadcast_threads: Option<usize>,
    #[serde(default)]
    pub policy: RawPolicy,
    #[serde(default)]
    pub func: BTreeMap<String, String>,
    #[serde(default)]
    pub aggregate: BTreeMap<String, String>,
}

/// A single branch or a group of branches
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum RawGroup {
    One(String),
    Many(Vec<String>),
}

/// Byte count or size string with suffix
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum RawSize {
    Bytes(u64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawPolicy {
    pub search: Option<String>,
    pub action: Option<String>,
    pub create: Option<String>,
}
