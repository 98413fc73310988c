use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of a local branch, unique within a project
pub type BranchName = String;

/// Opaque, content-derived commit identifier (e.g. a hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitId(pub String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CommitId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Relationship of a branch's current commit to its reference commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Current commit descends from the reference
    Ahead,
    /// Reference descends from the current commit
    Behind,
    /// Current and reference are the same commit
    Same,
    /// No ancestry relation could be determined
    Null,
}

/// Snapshot of every local branch and the commit it points at.
/// Replaced wholesale on each fetch, never patched.
pub type BranchCommitMap = BTreeMap<BranchName, CommitId>;

/// Relation of every branch, derived from one `BranchCommitMap`
pub type BranchRelationMap = BTreeMap<BranchName, Relation>;

/// Tag of one reconciliation cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
