use super::{
    branch::{BranchCommitMap, BranchRelationMap, Generation},
    project::ProjectId,
};

/// Per-project lookup issued alongside each reconciliation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    RemoteName,
    LocalName,
    ChangeCount,
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Lookup::RemoteName => "Remote name lookup",
            Lookup::LocalName => "Local name lookup",
            Lookup::ChangeCount => "Status check",
        };
        f.write_str(name)
    }
}

/// Domain events emitted by background tasks and applied on the service loop
#[derive(Debug, Clone)]
pub enum Event {
    /// The project set was resynchronized and listed
    ProjectsListed { ids: Vec<ProjectId>, at: i64 },

    /// Resynchronization or listing failed; the previous list stays
    RefreshFailed { msg: String },

    /// Remote display name resolved
    RemoteNameLoaded { id: ProjectId, name: Option<String> },

    /// Local display name resolved
    LocalNameLoaded { id: ProjectId, name: Option<String> },

    /// Working-tree change count resolved
    ChangeCountLoaded { id: ProjectId, count: usize },

    /// A name or change count lookup failed; the previous value stays
    LookupFailed {
        id: ProjectId,
        lookup: Lookup,
        msg: String,
    },

    /// Branch commit map, and each branch's reference commit, fetched for
    /// one reconciliation cycle
    CommitsFetched {
        id: ProjectId,
        generation: Generation,
        commits: BranchCommitMap,
        references: BranchCommitMap,
    },

    /// Branch commit map could not be fetched
    CommitsFetchFailed {
        id: ProjectId,
        generation: Generation,
        msg: String,
    },

    /// Every branch of one cycle has been classified
    BranchesClassified {
        id: ProjectId,
        generation: Generation,
        relations: BranchRelationMap,
    },

    /// A non-fatal error occurred
    Error { id: Option<ProjectId>, msg: String },

    /// User requested to quit the application
    QuitRequested,
}
