use crate::domain::CommitId;
use crate::error::ServiceResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A repository as listed by a hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedRepo {
    pub id: u64,
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    pub owner: Option<String>,
    pub html_url: Option<String>,
    pub clone_url: Option<String>,
    pub ssh_url: Option<String>,
}

impl HostedRepo {
    /// Whether a local remote URL points at this repository
    pub fn matches_url(&self, url: &str) -> bool {
        [&self.clone_url, &self.ssh_url, &self.html_url]
            .into_iter()
            .flatten()
            .any(|candidate| match_remote_url(candidate, url))
    }
}

/// Port for the hosting service that owns the user's remote repositories
#[async_trait]
pub trait HostingCatalog: Send + Sync {
    /// Every repository visible to the authenticated user
    async fn list_repos(&self) -> ServiceResult<Vec<HostedRepo>>;

    /// Head commit of `branch`; `None` when the branch does not exist
    async fn branch_head(&self, repo: &HostedRepo, branch: &str) -> ServiceResult<Option<CommitId>>;

    /// Commits reachable from `branch`, newest first; `None` when the branch
    /// does not exist
    async fn branch_history(
        &self,
        repo: &HostedRepo,
        branch: &str,
    ) -> ServiceResult<Option<Vec<CommitId>>>;
}

/// Compare two remote URLs ignoring the HTTP scheme and a `.git` suffix
pub fn match_remote_url(a: &str, b: &str) -> bool {
    normalize_remote_url(a) == normalize_remote_url(b)
}

fn normalize_remote_url(url: &str) -> &str {
    let url = url.trim().trim_end_matches('/');
    let url = url.strip_suffix(".git").unwrap_or(url);
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> HostedRepo {
        HostedRepo {
            id: 7,
            name: "widget-tool".to_string(),
            full_name: "acme/widget-tool".to_string(),
            owner: Some("acme".to_string()),
            html_url: Some("https://github.com/acme/widget-tool".to_string()),
            clone_url: Some("https://github.com/acme/widget-tool.git".to_string()),
            ssh_url: Some("git@github.com:acme/widget-tool.git".to_string()),
        }
    }

    #[test]
    fn test_match_remote_url_ignores_scheme_and_suffix() {
        assert!(match_remote_url(
            "https://github.com/acme/widget-tool.git",
            "http://github.com/acme/widget-tool"
        ));
        assert!(match_remote_url(
            "github.com/acme/widget-tool",
            "https://github.com/acme/widget-tool.git/"
        ));
        assert!(match_remote_url(
            "git@github.com:acme/widget-tool",
            "git@github.com:acme/widget-tool.git"
        ));
        assert!(!match_remote_url(
            "https://github.com/acme/widget-tool.git",
            "https://github.com/acme/widget.git"
        ));
    }

    #[test]
    fn test_hosted_repo_matches_http_and_ssh_remotes() {
        let repo = widget();
        assert!(repo.matches_url("git@github.com:acme/widget-tool.git"));
        assert!(repo.matches_url("https://github.com/acme/widget-tool"));
        assert!(!repo.matches_url("git@github.com:acme/other.git"));
    }
}
