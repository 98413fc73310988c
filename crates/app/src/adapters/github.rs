use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use repodeck_core::domain::CommitId;
use repodeck_core::error::ServiceResult;
use repodeck_core::ports::{HostedRepo, HostingCatalog};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

const PAGE_SIZE: usize = 100;

/// Hosting catalog backed by the GitHub REST API
#[derive(Debug, Clone)]
pub struct GithubCatalog {
    http_client: HttpClient,
    api_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct GithubOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubRepo {
    id: u64,
    name: String,
    full_name: String,
    owner: Option<GithubOwner>,
    html_url: Option<String>,
    clone_url: Option<String>,
    ssh_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubCommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GithubBranch {
    commit: GithubCommitRef,
}

impl From<GithubRepo> for HostedRepo {
    fn from(repo: GithubRepo) -> Self {
        Self {
            id: repo.id,
            name: repo.name,
            full_name: repo.full_name,
            owner: repo.owner.map(|owner| owner.login),
            html_url: repo.html_url,
            clone_url: repo.clone_url,
            ssh_url: repo.ssh_url,
        }
    }
}

impl GithubCatalog {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let http_client = HttpClient::builder()
            .user_agent(concat!("repodeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// GET a JSON resource; `None` on 404
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.api_url, path);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("{} returned {}: {}", url, status, text);
        }

        let body = response
            .json::<T>()
            .await
            .with_context(|| format!("Unexpected response from {}", url))?;
        Ok(Some(body))
    }

    /// Fetch every page of a listing
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<Vec<T>>> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let mut paged = query.to_vec();
            paged.push(("per_page", PAGE_SIZE.to_string()));
            paged.push(("page", page.to_string()));

            let Some(batch) = self.get::<Vec<T>>(path, &paged).await? else {
                return Ok(None);
            };
            let last = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if last {
                return Ok(Some(items));
            }
            page += 1;
        }
    }
}

#[async_trait]
impl HostingCatalog for GithubCatalog {
    async fn list_repos(&self) -> ServiceResult<Vec<HostedRepo>> {
        let repos: Vec<GithubRepo> = self
            .get_all("/user/repos", &[("visibility", "all".to_string())])
            .await?
            .unwrap_or_default();
        info!("Hosting service lists {} repositories", repos.len());
        Ok(repos.into_iter().map(HostedRepo::from).collect())
    }

    async fn branch_head(&self, repo: &HostedRepo, branch: &str) -> ServiceResult<Option<CommitId>> {
        let path = format!("/repos/{}/branches/{}", repo.full_name, branch);
        let branch: Option<GithubBranch> = self.get(&path, &[]).await?;
        Ok(branch.map(|b| CommitId(b.commit.sha)))
    }

    async fn branch_history(
        &self,
        repo: &HostedRepo,
        branch: &str,
    ) -> ServiceResult<Option<Vec<CommitId>>> {
        if self.branch_head(repo, branch).await?.is_none() {
            return Ok(None);
        }

        let path = format!("/repos/{}/commits", repo.full_name);
        let commits: Option<Vec<GithubCommitRef>> = self
            .get_all(&path, &[("sha", branch.to_string())])
            .await?;
        Ok(commits.map(|commits| commits.into_iter().map(|c| CommitId(c.sha)).collect()))
    }
}
