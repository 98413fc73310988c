use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration store interface
pub trait ConfigStore: Send + Sync {
    /// Load configuration from storage
    fn load(&self) -> Result<AppConfig>;

    /// Save configuration to storage
    fn save(&self, config: &AppConfig) -> Result<()>;
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: u32,
    /// Directories scanned for projects; empty means the home directory
    #[serde(default)]
    pub project_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub reference: ReferencePolicy,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub hosting: HostingConfig,
}

/// Discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// How deep below each project dir to look for repositories
    pub max_depth: usize,
}

/// Background refresh configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between commit map polls, 0 disables polling
    pub poll_interval_secs: u64,
}

/// Which commit a branch is compared against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// The branch's tracked upstream
    #[default]
    Upstream,
    /// A fixed baseline revision, e.g. `origin/main`
    Fixed { refname: String },
    /// The same-named branch on the matched hosted repository
    Hosted,
}

/// Remote hosting service access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostingConfig {
    /// REST API root of the hosting service
    pub api_url: String,
    /// Personal access token; remote repositories are not listed without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    pub show_commit_ids: bool,
}

impl AppConfig {
    pub fn poll_interval(&self) -> Option<std::time::Duration> {
        match self.refresh.poll_interval_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            project_dirs: Vec::new(),
            scan: ScanConfig::default(),
            refresh: RefreshConfig::default(),
            reference: ReferencePolicy::default(),
            ui: UiConfig::default(),
            hosting: HostingConfig::default(),
        }
    }
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { max_depth: 1 }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_commit_ids: true,
        }
    }
}
