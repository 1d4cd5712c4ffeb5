use crate::humanize::HumanDuration;
use crate::providers::{FileType, LinkType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// File type to path fragment overrides
    #[serde(default)]
    pub paths: BTreeMap<FileType, String>,
    /// Registration order is significant for every provider collection
    #[serde(default)]
    pub download_providers: Vec<DownloadProviderConfig>,
    #[serde(default)]
    pub source_providers: Vec<SourceProviderConfig>,
    #[serde(default)]
    pub pt_providers: Vec<PtProviderConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Upper bound for webhook request bodies
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// Bearer token (loaded from environment, not from config file)
    #[serde(skip)]
    pub auth_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_payload_bytes: default_max_payload_bytes(),
            auth_token: None,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3080))
}

fn default_max_payload_bytes() -> usize {
    64 * 1024
}

/// Download executor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Root directory every destination path is resolved against
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Upper bound for a single download provider call
    #[serde(default = "default_download_timeout")]
    pub timeout: HumanDuration,
    /// Issue a HEAD request to detect torrent files served without extension
    #[serde(default)]
    pub probe_link_type: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            timeout: default_download_timeout(),
            probe_link_type: false,
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_download_timeout() -> HumanDuration {
    HumanDuration::from_secs(5 * 60)
}

/// Periodic server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_interval")]
    pub interval: HumanDuration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: default_scheduler_interval(),
        }
    }
}

fn default_scheduler_interval() -> HumanDuration {
    HumanDuration::from_secs(60 * 60)
}

/// Download provider implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadProviderKind {
    Http,
    Aria2,
}

/// Download provider entry (`[[download_providers]]`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadProviderConfig {
    pub name: String,
    pub kind: DownloadProviderKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// aria2 JSON-RPC endpoint, e.g. `http://localhost:6800/jsonrpc`
    #[serde(default)]
    pub rpc_endpoint: Option<String>,
    /// Name of the environment variable holding the RPC secret
    #[serde(default)]
    pub rpc_secret_env: Option<String>,
    #[serde(skip)]
    pub rpc_secret: Option<String>,
}

/// Source provider implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceProviderKind {
    Pattern,
    PageScrape,
    WatchList,
}

/// Source provider entry (`[[source_providers]]`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceProviderConfig {
    pub name: String,
    pub kind: SourceProviderKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub webhook_enabled: bool,
    /// Regex a source must match to be handled by this provider
    pub pattern: String,
    /// Regex extracting links from a fetched page (`page_scrape` only)
    #[serde(default)]
    pub link_pattern: Option<String>,
    #[serde(default)]
    pub file_type: FileType,
    #[serde(default)]
    pub link_type: LinkType,
    /// Destination fragment under the file type directory
    #[serde(default)]
    pub path: String,
    /// JSON file persisting the watch list (`watch_list` only)
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    #[serde(default)]
    pub prefer_download_provider: Option<String>,
}

/// Private tracker provider entry (`[[pt_providers]]`), introspection only
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PtProviderConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}
