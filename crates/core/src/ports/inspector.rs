use crate::domain::{BranchCommitMap, CommitId, ProjectId, Relation};
use crate::error::ServiceResult;
use async_trait::async_trait;

/// Port for the repository inspection service.
///
/// Every call is a suspension point and may fail independently of the others.
/// Reference commit selection for `classify_relation` belongs to the
/// implementation (tracked upstream, fixed baseline, ...).
#[async_trait]
pub trait RepositoryInspector: Send + Sync {
    /// Rescan the backing project set
    async fn resync_project_set(&self) -> ServiceResult<()>;

    /// Authoritative list of project ids after the last resync
    async fn list_project_ids(&self) -> ServiceResult<Vec<ProjectId>>;

    /// Remote display name, if the project has a remote
    async fn remote_name(&self, id: &ProjectId) -> ServiceResult<Option<String>>;

    /// Local display name, if the project has a local checkout
    async fn local_name(&self, id: &ProjectId) -> ServiceResult<Option<String>>;

    /// Current commit of every local branch
    async fn branch_commit_map(&self, id: &ProjectId) -> ServiceResult<BranchCommitMap>;

    /// Reference commit of every local branch that has one. Branches
    /// without a reference are left out.
    async fn reference_commit_map(&self, id: &ProjectId) -> ServiceResult<BranchCommitMap>;

    /// Relation of `current` on `branch` to that branch's reference commit
    async fn classify_relation(
        &self,
        id: &ProjectId,
        branch: &str,
        current: &CommitId,
    ) -> ServiceResult<Relation>;

    /// Number of changed entries in the working tree
    async fn change_count(&self, id: &ProjectId) -> ServiceResult<usize>;
}
