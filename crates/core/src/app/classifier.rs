//! Relation classification of a branch's current commit against its reference.
//!
//! Classification never fails: an unknown commit, a diverged history or an
//! unreachable backend all collapse into [`Relation::Null`].

use crate::domain::{CommitId, Relation};
use crate::error::ServiceResult;
use tracing::{debug, warn};

/// Ancestry queries over a project's commit history
pub trait CommitGraph {
    /// Whether `commit` is a strict descendant of `ancestor`
    fn is_descendant_of(&self, commit: &CommitId, ancestor: &CommitId) -> ServiceResult<bool>;
}

/// Classify `current` against `reference`
pub fn classify<G: CommitGraph + ?Sized>(
    graph: &G,
    current: &CommitId,
    reference: &CommitId,
) -> Relation {
    if current == reference {
        return Relation::Same;
    }

    match graph.is_descendant_of(current, reference) {
        Ok(true) => return Relation::Ahead,
        Ok(false) => {}
        Err(e) => {
            debug!("Ancestry lookup {} -> {} failed: {}", current, reference, e);
            return Relation::Null;
        }
    }

    match graph.is_descendant_of(reference, current) {
        Ok(true) => Relation::Behind,
        Ok(false) => Relation::Null,
        Err(e) => {
            debug!("Ancestry lookup {} -> {} failed: {}", reference, current, e);
            Relation::Null
        }
    }
}

/// Classify `current` against a hosted branch history listed newest first.
///
/// A commit the hosted history has never seen is taken to be local work on
/// top of it.
pub fn classify_against_history(current: &CommitId, history: &[CommitId]) -> Relation {
    match history.first() {
        None => Relation::Null,
        Some(head) if head == current => Relation::Same,
        Some(_) if history.contains(current) => Relation::Behind,
        Some(_) => Relation::Ahead,
    }
}

/// Fold the outcome of a classification request into a relation
pub fn settle(branch: &str, outcome: ServiceResult<Relation>) -> Relation {
    match outcome {
        Ok(relation) => relation,
        Err(e) => {
            warn!("Classification of branch {} failed, treating as Null: {}", branch, e);
            Relation::Null
        }
    }
}
