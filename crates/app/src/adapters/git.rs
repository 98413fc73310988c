use anyhow::{Context, Result};
use async_trait::async_trait;
use git2::{BranchType, ErrorCode, Oid, Repository as GitRepository, StatusOptions};
use repodeck_core::app::{classify, classify_against_history, CommitGraph};
use repodeck_core::domain::{BranchCommitMap, CommitId, ProjectId, Relation};
use repodeck_core::error::{ServiceError, ServiceResult};
use repodeck_core::ports::{
    DiscoverReq, DiscoveryPort, HostedRepo, HostingCatalog, ReferencePolicy, RepositoryInspector,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// A tracked project: a local checkout, a hosted repository, or both
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectEntry {
    pub path: Option<PathBuf>,
    pub hosted: Option<HostedRepo>,
}

/// Repository inspection service backed by local git checkouts, optionally
/// merged with the repositories listed by a hosting service
pub struct GitInspector {
    discovery: Arc<dyn DiscoveryPort>,
    catalog: Option<Arc<dyn HostingCatalog>>,
    project_dirs: Vec<PathBuf>,
    max_depth: usize,
    reference: ReferencePolicy,
    /// Projects keyed by ProjectId, replaced on every resync
    projects: Arc<RwLock<BTreeMap<ProjectId, ProjectEntry>>>,
}

impl GitInspector {
    pub fn new(
        discovery: Arc<dyn DiscoveryPort>,
        project_dirs: Vec<PathBuf>,
        max_depth: usize,
        reference: ReferencePolicy,
    ) -> Self {
        Self {
            discovery,
            catalog: None,
            project_dirs,
            max_depth,
            reference,
            projects: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Also list the hosting service's repositories and match them to checkouts
    pub fn with_catalog(mut self, catalog: Arc<dyn HostingCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    fn project(&self, id: &ProjectId) -> ServiceResult<ProjectEntry> {
        let projects = self
            .projects
            .read()
            .map_err(|_| anyhow::anyhow!("Project registry lock poisoned"))?;
        projects
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownProject { id: id.to_string() })
    }

    /// Scan every project dir; `None` when every one of them failed
    async fn scan_checkouts(&self) -> ServiceResult<Option<BTreeMap<ProjectId, PathBuf>>> {
        let discovery = self.discovery.clone();
        let dirs = self.project_dirs.clone();
        let max_depth = self.max_depth;

        let (found, failures) = blocking(move || {
            let mut found: BTreeMap<ProjectId, PathBuf> = BTreeMap::new();
            let mut failures = 0usize;
            for base in dirs {
                match discovery.scan(DiscoverReq {
                    base: base.clone(),
                    max_depth,
                }) {
                    Ok(projects) => {
                        found.extend(projects.into_iter().map(|(id, meta)| (id, meta.path)))
                    }
                    Err(e) => {
                        warn!("Skipping project dir {}: {:#}", base.display(), e);
                        failures += 1;
                    }
                }
            }
            Ok((found, failures))
        })
        .await?;

        if !self.project_dirs.is_empty() && failures == self.project_dirs.len() {
            return Ok(None);
        }
        Ok(Some(found))
    }
}

/// Pair checkouts with hosted repositories by remote URL. Hosted
/// repositories no checkout points at become remote-only projects.
pub fn pair_projects(
    checkouts: Vec<(ProjectId, PathBuf, Option<String>)>,
    hosted: Vec<HostedRepo>,
) -> BTreeMap<ProjectId, ProjectEntry> {
    let mut unmatched = hosted;
    let mut projects = BTreeMap::new();

    for (id, path, url) in checkouts {
        let matched = url
            .and_then(|url| unmatched.iter().position(|repo| repo.matches_url(&url)))
            .map(|index| unmatched.swap_remove(index));
        projects.insert(
            id,
            ProjectEntry {
                path: Some(path),
                hosted: matched,
            },
        );
    }

    for repo in unmatched {
        projects.insert(
            hosted_project_id(&repo),
            ProjectEntry {
                path: None,
                hosted: Some(repo),
            },
        );
    }

    projects
}

/// Id of a project known only to the hosting service
pub fn hosted_project_id(repo: &HostedRepo) -> ProjectId {
    ProjectId(format!("hosted:{}", repo.full_name))
}

/// Run blocking git work off the async executor
async fn blocking<T, F>(work: F) -> ServiceResult<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let joined = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Unavailable {
            reason: format!("Inspection task failed: {}", e),
        })?;
    joined.map_err(ServiceError::from)
}

/// Open git repository at the given path
fn open_repo(path: &Path) -> Result<GitRepository> {
    GitRepository::open(path)
        .with_context(|| format!("Failed to open git repository at {}", path.display()))
}

/// URL of `origin`, or of the first remote
fn remote_url(git_repo: &GitRepository) -> Result<Option<String>> {
    let remotes = git_repo.remotes().context("Failed to list remotes")?;
    let names: Vec<&str> = remotes.iter().flatten().collect();

    let Some(remote) = names
        .iter()
        .find(|name| **name == "origin")
        .or_else(|| names.first())
    else {
        return Ok(None);
    };

    let remote = git_repo
        .find_remote(remote)
        .with_context(|| format!("Remote '{}' not found", remote))?;
    Ok(remote.url().map(str::to_string))
}

fn local_branch_commits(git_repo: &GitRepository, path: &Path) -> Result<BranchCommitMap> {
    let branches = git_repo
        .branches(Some(BranchType::Local))
        .context("Failed to list local branches")?;

    let mut commits = BranchCommitMap::new();
    for entry in branches {
        let (branch, _) = match entry {
            Ok(b) => b,
            Err(e) => {
                warn!("Skipping unreadable branch in {}: {}", path.display(), e);
                continue;
            }
        };
        let name = match branch.name() {
            Ok(Some(name)) => name.to_string(),
            Ok(None) | Err(_) => {
                warn!("Skipping branch with non-utf8 name in {}", path.display());
                continue;
            }
        };
        match branch.get().target() {
            Some(oid) => {
                commits.insert(name, CommitId(oid.to_string()));
            }
            None => warn!("Branch {} in {} has no target", name, path.display()),
        }
    }
    Ok(commits)
}

#[async_trait]
impl RepositoryInspector for GitInspector {
    async fn resync_project_set(&self) -> ServiceResult<()> {
        let checkouts = self.scan_checkouts().await?;

        let hosted = match &self.catalog {
            Some(catalog) => match catalog.list_repos().await {
                Ok(repos) => Some(repos),
                Err(e) => {
                    warn!("Listing hosted repositories failed: {}", e);
                    None
                }
            },
            None => None,
        };

        // Fails only when every configured source failed
        let checkouts = match checkouts {
            Some(checkouts) => checkouts,
            None if hosted.is_some() => BTreeMap::new(),
            None => {
                return Err(ServiceError::Unavailable {
                    reason: "No project directory could be scanned".to_string(),
                })
            }
        };

        let found = match hosted {
            Some(hosted) => {
                let with_urls = blocking(move || {
                    Ok(checkouts
                        .into_iter()
                        .map(|(id, path)| {
                            let url = match open_repo(&path).and_then(|repo| remote_url(&repo)) {
                                Ok(url) => url,
                                Err(e) => {
                                    warn!("No remote URL for {}: {:#}", path.display(), e);
                                    None
                                }
                            };
                            (id, path, url)
                        })
                        .collect::<Vec<_>>())
                })
                .await?;
                pair_projects(with_urls, hosted)
            }
            None => checkouts
                .into_iter()
                .map(|(id, path)| {
                    let entry = ProjectEntry {
                        path: Some(path),
                        hosted: None,
                    };
                    (id, entry)
                })
                .collect(),
        };

        info!("Resync found {} projects", found.len());
        let mut projects = self
            .projects
            .write()
            .map_err(|_| anyhow::anyhow!("Project registry lock poisoned"))?;
        *projects = found;
        Ok(())
    }

    async fn list_project_ids(&self) -> ServiceResult<Vec<ProjectId>> {
        let projects = self
            .projects
            .read()
            .map_err(|_| anyhow::anyhow!("Project registry lock poisoned"))?;
        Ok(projects.keys().cloned().collect())
    }

    async fn remote_name(&self, id: &ProjectId) -> ServiceResult<Option<String>> {
        let entry = self.project(id)?;
        if let Some(hosted) = entry.hosted {
            return Ok(Some(hosted.name));
        }
        let Some(path) = entry.path else {
            return Ok(None);
        };
        blocking(move || {
            let git_repo = open_repo(&path)?;
            Ok(remote_url(&git_repo)?.as_deref().and_then(repo_name_from_url))
        })
        .await
    }

    async fn local_name(&self, id: &ProjectId) -> ServiceResult<Option<String>> {
        let Some(path) = self.project(id)?.path else {
            return Ok(None);
        };
        let name = path.file_name().and_then(|n| n.to_str()).map(str::to_string);
        if name.is_none() {
            warn!(
                "Could not establish local name from {}, not valid unicode or ends in ..",
                path.display()
            );
        }
        Ok(name)
    }

    async fn branch_commit_map(&self, id: &ProjectId) -> ServiceResult<BranchCommitMap> {
        let Some(path) = self.project(id)?.path else {
            return Ok(BranchCommitMap::new());
        };
        blocking(move || {
            let git_repo = open_repo(&path)?;
            local_branch_commits(&git_repo, &path)
        })
        .await
    }

    async fn reference_commit_map(&self, id: &ProjectId) -> ServiceResult<BranchCommitMap> {
        let entry = self.project(id)?;
        let Some(path) = entry.path else {
            return Ok(BranchCommitMap::new());
        };

        if self.reference == ReferencePolicy::Hosted {
            let (Some(catalog), Some(hosted)) = (&self.catalog, &entry.hosted) else {
                return Ok(BranchCommitMap::new());
            };
            let branches = blocking(move || {
                let git_repo = open_repo(&path)?;
                local_branch_commits(&git_repo, &path)
            })
            .await?;

            let mut references = BranchCommitMap::new();
            for branch in branches.into_keys() {
                if let Some(head) = catalog.branch_head(hosted, &branch).await? {
                    references.insert(branch, head);
                }
            }
            return Ok(references);
        }

        let policy = self.reference.clone();
        blocking(move || {
            let git_repo = open_repo(&path)?;
            let mut references = BranchCommitMap::new();
            for branch in local_branch_commits(&git_repo, &path)?.into_keys() {
                if let Some(reference) = resolve_reference(&git_repo, &branch, &policy)? {
                    references.insert(branch, reference);
                }
            }
            Ok(references)
        })
        .await
    }

    async fn classify_relation(
        &self,
        id: &ProjectId,
        branch: &str,
        current: &CommitId,
    ) -> ServiceResult<Relation> {
        let entry = self.project(id)?;

        if self.reference == ReferencePolicy::Hosted {
            let (Some(catalog), Some(hosted)) = (&self.catalog, &entry.hosted) else {
                debug!("{} has no hosted repository to compare against", id);
                return Ok(Relation::Null);
            };
            return Ok(match catalog.branch_history(hosted, branch).await? {
                Some(history) => classify_against_history(current, &history),
                None => Relation::Null,
            });
        }

        let Some(path) = entry.path else {
            return Ok(Relation::Null);
        };
        let branch = branch.to_string();
        let current = current.clone();
        let policy = self.reference.clone();

        blocking(move || {
            let git_repo = open_repo(&path)?;
            let Some(reference) = resolve_reference(&git_repo, &branch, &policy)? else {
                debug!("Branch {} has no reference commit", branch);
                return Ok(Relation::Null);
            };
            Ok(classify(&GitGraph(&git_repo), &current, &reference))
        })
        .await
    }

    async fn change_count(&self, id: &ProjectId) -> ServiceResult<usize> {
        // A remote-only project has no working tree to be dirty
        let Some(path) = self.project(id)?.path else {
            return Ok(0);
        };
        blocking(move || {
            let git_repo = open_repo(&path)?;

            let mut status_options = StatusOptions::new();
            status_options.include_untracked(true);
            status_options.include_ignored(false);

            let statuses = git_repo
                .statuses(Some(&mut status_options))
                .context("Failed to get git status")?;
            Ok(statuses.len())
        })
        .await
    }
}

/// Resolve the commit a branch is compared against; `None` when there is none
fn resolve_reference(
    git_repo: &GitRepository,
    branch: &str,
    policy: &ReferencePolicy,
) -> Result<Option<CommitId>> {
    match policy {
        ReferencePolicy::Upstream => {
            let local = git_repo
                .find_branch(branch, BranchType::Local)
                .with_context(|| format!("Branch '{}' not found", branch))?;
            let upstream = match local.upstream() {
                Ok(upstream) => upstream,
                Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read upstream of '{}'", branch))
                }
            };
            Ok(upstream.get().target().map(|oid| CommitId(oid.to_string())))
        }
        ReferencePolicy::Fixed { refname } => match git_repo.revparse_single(refname) {
            Ok(object) => {
                let commit = object
                    .peel_to_commit()
                    .with_context(|| format!("'{}' does not name a commit", refname))?;
                Ok(Some(CommitId(commit.id().to_string())))
            }
            Err(e) => {
                debug!("Baseline '{}' does not resolve: {}", refname, e);
                Ok(None)
            }
        },
        // Answered by the hosting catalog
        ReferencePolicy::Hosted => Ok(None),
    }
}

/// Ancestry queries answered by libgit2
struct GitGraph<'r>(&'r GitRepository);

impl GitGraph<'_> {
    fn oid(id: &CommitId) -> ServiceResult<Oid> {
        Oid::from_str(id.as_str()).map_err(|_| ServiceError::UnknownCommit { id: id.to_string() })
    }
}

impl CommitGraph for GitGraph<'_> {
    fn is_descendant_of(&self, commit: &CommitId, ancestor: &CommitId) -> ServiceResult<bool> {
        let (commit_oid, ancestor_oid) = (Self::oid(commit)?, Self::oid(ancestor)?);
        for (id, oid) in [(commit, commit_oid), (ancestor, ancestor_oid)] {
            if self.0.find_commit(oid).is_err() {
                return Err(ServiceError::UnknownCommit { id: id.to_string() });
            }
        }
        self.0
            .graph_descendant_of(commit_oid, ancestor_oid)
            .map_err(|e| ServiceError::Backend {
                source: anyhow::Error::new(e).context("Ancestry lookup failed"),
            })
    }
}

/// Repository name from a remote URL (HTTP(S) or SSH form)
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let name = trimmed.rsplit(['/', ':']).next()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
