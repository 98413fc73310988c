use crate::domain::project::{ProjectId, ProjectMeta};
use anyhow::Result;
use std::path::PathBuf;

/// Request for project discovery
#[derive(Clone, Debug)]
pub struct DiscoverReq {
    pub base: PathBuf,
    pub max_depth: usize,
}

/// Port for project discovery
pub trait DiscoveryPort: Send + Sync {
    /// Scan for projects in the given base directory
    /// This is blocking - caller should run in spawn_blocking
    fn scan(&self, req: DiscoverReq) -> Result<Vec<(ProjectId, ProjectMeta)>>;
}
