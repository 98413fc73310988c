use anyhow::Result;
use repodeck_core::domain::{ProjectId, ProjectMeta};
use repodeck_core::ports::{DiscoverReq, DiscoveryPort};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// File system discovery adapter that implements DiscoveryPort
pub struct FsDiscoveryAdapter;

impl FsDiscoveryAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Find all git repositories up to `max_depth` levels below the base path
    fn find_projects(&self, base_path: &Path, max_depth: usize) -> Result<Vec<ProjectMeta>> {
        if !base_path.is_dir() {
            anyhow::bail!("Project directory does not exist: {}", base_path.display());
        }

        let mut projects = Vec::new();

        for entry in WalkDir::new(base_path)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Skip .git directories and don't descend into them
                if e.file_name() == ".git" {
                    return false;
                }

                // Never descend into a repository's working tree
                if let Some(parent) = e.path().parent() {
                    if parent != base_path && parent.join(".git").exists() {
                        return false;
                    }
                }

                e.file_type().is_dir()
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry below {}: {}", base_path.display(), e);
                    continue;
                }
            };

            if entry.path().join(".git").exists() {
                let path = entry.path().to_path_buf();
                let name = path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();

                projects.push(ProjectMeta { name, path });
            }
        }

        Ok(projects)
    }
}

impl DiscoveryPort for FsDiscoveryAdapter {
    fn scan(&self, req: DiscoverReq) -> Result<Vec<(ProjectId, ProjectMeta)>> {
        let projects = self.find_projects(&req.base, req.max_depth)?;

        Ok(projects
            .into_iter()
            .map(|meta| (ProjectId::from_path(&meta.path), meta))
            .collect())
    }
}

impl Default for FsDiscoveryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_fake_git_repo(path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        fs::create_dir(path.join(".git"))?;
        Ok(())
    }

    fn scan(base: &Path, max_depth: usize) -> Result<Vec<(ProjectId, ProjectMeta)>> {
        FsDiscoveryAdapter::new().scan(DiscoverReq {
            base: base.to_path_buf(),
            max_depth,
        })
    }

    #[test]
    fn test_scan_empty_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        assert!(scan(temp_dir.path(), 1)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_scan_finds_direct_children() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let base = temp_dir.path();
        create_fake_git_repo(&base.join("widget"))?;
        create_fake_git_repo(&base.join("gadget"))?;
        fs::create_dir(base.join("notes"))?;
        fs::write(base.join("README.md"), "not a project")?;

        let found = scan(base, 1)?;
        let names: Vec<_> = found.iter().map(|(_, meta)| meta.name.as_str()).collect();
        assert_eq!(names, vec!["gadget", "widget"]);
        assert_eq!(found[1].0, ProjectId::from_path(&base.join("widget")));
        Ok(())
    }

    #[test]
    fn test_scan_respects_max_depth() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let base = temp_dir.path();
        create_fake_git_repo(&base.join("work").join("service"))?;

        assert!(scan(base, 1)?.is_empty());
        let found = scan(base, 2)?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.name, "service");
        Ok(())
    }

    #[test]
    fn test_scan_does_not_descend_into_repositories() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let base = temp_dir.path();
        create_fake_git_repo(&base.join("outer"))?;
        create_fake_git_repo(&base.join("outer").join("vendored"))?;

        let found = scan(base, 3)?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.name, "outer");
        Ok(())
    }

    #[test]
    fn test_scan_missing_directory_fails() {
        let result = scan(Path::new("/definitely/not/here/repodeck"), 1);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_unreadable_directories() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new()?;
        let base = temp_dir.path();
        create_fake_git_repo(&base.join("widget"))?;
        let locked = base.join("locked");
        create_fake_git_repo(&locked.join("hidden"))?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

        let result = scan(base, 2);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

        let names: Vec<_> = result?
            .into_iter()
            .map(|(_, meta)| meta.name)
            .collect();
        assert!(names.contains(&"widget".to_string()));
        Ok(())
    }
}
