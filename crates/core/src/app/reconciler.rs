//! Per-project branch reconciliation state machine.
//!
//! `Idle -> FetchingCommits -> ClassifyingBranches -> Ready`, re-entering
//! `FetchingCommits` from `Ready` on every refresh. Each cycle is tagged with a
//! [`Generation`]; results carrying any other generation are dropped. The
//! commit map and relation map of a cycle become visible together, and only
//! once every branch of that cycle has been classified.

use crate::domain::{BranchCommitMap, BranchRelationMap, Generation, Relation};
use serde::{Deserialize, Serialize};
use tracing::debug;

static EMPTY_COMMITS: BranchCommitMap = BranchCommitMap::new();
static EMPTY_RELATIONS: BranchRelationMap = BranchRelationMap::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReconcileState {
    #[default]
    Idle,
    FetchingCommits,
    ClassifyingBranches,
    Ready,
}

/// What started a reconciliation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    /// Initial load or an explicit refresh; always reclassifies
    Explicit,
    /// Periodic check; only reclassifies when a branch or its reference moved
    Poll,
}

/// Result of handing a fetched commit map to the reconciler
#[derive(Debug, Clone, PartialEq)]
pub enum CommitsOutcome {
    /// The fetch belongs to a superseded cycle
    Stale,
    /// Polled branch and reference commits matched the published ones;
    /// back to `Ready`
    Unchanged,
    /// Every branch of this map must now be classified
    Classify(BranchCommitMap),
}

#[derive(Debug, Clone)]
struct Pending {
    commits: BranchCommitMap,
    references: BranchCommitMap,
}

#[derive(Debug, Clone)]
struct Published {
    generation: Generation,
    commits: BranchCommitMap,
    references: BranchCommitMap,
    relations: BranchRelationMap,
}

#[derive(Debug, Clone)]
pub struct BranchReconciler {
    state: ReconcileState,
    generation: Generation,
    trigger: CycleTrigger,
    pending: Option<Pending>,
    published: Option<Published>,
}

impl Default for BranchReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchReconciler {
    pub fn new() -> Self {
        Self {
            state: ReconcileState::Idle,
            generation: Generation::default(),
            trigger: CycleTrigger::Explicit,
            pending: None,
            published: None,
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// Tag of the most recently started cycle
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Tag of the cycle whose results are currently visible
    pub fn published_generation(&self) -> Option<Generation> {
        self.published.as_ref().map(|p| p.generation)
    }

    /// Whether a cycle is in flight
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            ReconcileState::FetchingCommits | ReconcileState::ClassifyingBranches
        )
    }

    /// Start a new cycle, superseding any cycle still in flight
    pub fn begin_fetch(&mut self, trigger: CycleTrigger) -> Generation {
        self.generation = self.generation.next();
        self.state = ReconcileState::FetchingCommits;
        self.trigger = trigger;
        self.pending = None;
        self.generation
    }

    /// Hand over the branch commits of `generation` together with the
    /// reference commit of every branch that has one.
    pub fn accept_commits(
        &mut self,
        generation: Generation,
        commits: BranchCommitMap,
        references: BranchCommitMap,
    ) -> CommitsOutcome {
        if generation != self.generation || self.state != ReconcileState::FetchingCommits {
            debug!("Dropping commit map of stale cycle {}", generation);
            return CommitsOutcome::Stale;
        }

        // A relation moves when either side of the comparison moves
        let unchanged = self
            .published
            .as_ref()
            .is_some_and(|p| p.commits == commits && p.references == references);
        if self.trigger == CycleTrigger::Poll && unchanged {
            self.state = ReconcileState::Ready;
            return CommitsOutcome::Unchanged;
        }

        self.state = ReconcileState::ClassifyingBranches;
        self.pending = Some(Pending {
            commits: commits.clone(),
            references,
        });
        CommitsOutcome::Classify(commits)
    }

    /// The fetch of `generation` failed. Returns false for a stale cycle.
    pub fn fetch_failed(&mut self, generation: Generation) -> bool {
        if generation != self.generation || self.state != ReconcileState::FetchingCommits {
            return false;
        }
        self.state = if self.published.is_some() {
            ReconcileState::Ready
        } else {
            ReconcileState::Idle
        };
        true
    }

    /// Commit the complete classification of `generation`.
    /// Returns false, and changes nothing, for a stale cycle.
    pub fn publish(&mut self, generation: Generation, relations: BranchRelationMap) -> bool {
        if generation != self.generation || self.state != ReconcileState::ClassifyingBranches {
            debug!("Dropping classification of stale cycle {}", generation);
            return false;
        }
        let Some(Pending {
            commits,
            references,
        }) = self.pending.take()
        else {
            return false;
        };

        // Key set always matches the cycle's commit map
        let relations = commits
            .keys()
            .map(|branch| {
                let relation = relations.get(branch).copied().unwrap_or(Relation::Null);
                (branch.clone(), relation)
            })
            .collect();

        self.published = Some(Published {
            generation,
            commits,
            references,
            relations,
        });
        self.state = ReconcileState::Ready;
        true
    }

    /// Relations of the last published cycle, empty before the first one
    pub fn relations(&self) -> &BranchRelationMap {
        self.published
            .as_ref()
            .map(|p| &p.relations)
            .unwrap_or(&EMPTY_RELATIONS)
    }

    /// Commit map the published relations were derived from
    pub fn commits(&self) -> &BranchCommitMap {
        self.published
            .as_ref()
            .map(|p| &p.commits)
            .unwrap_or(&EMPTY_COMMITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CommitId;

    fn commits(entries: &[(&str, &str)]) -> BranchCommitMap {
        entries
            .iter()
            .map(|(b, c)| (b.to_string(), CommitId::from(*c)))
            .collect()
    }

    fn no_refs() -> BranchCommitMap {
        BranchCommitMap::new()
    }

    fn relations(entries: &[(&str, Relation)]) -> BranchRelationMap {
        entries.iter().map(|(b, r)| (b.to_string(), *r)).collect()
    }

    #[test]
    fn test_full_cycle_publishes_relations() {
        let mut reconciler = BranchReconciler::new();
        assert_eq!(reconciler.state(), ReconcileState::Idle);
        assert!(reconciler.relations().is_empty());

        let generation = reconciler.begin_fetch(CycleTrigger::Explicit);
        assert_eq!(reconciler.state(), ReconcileState::FetchingCommits);

        let map = commits(&[("main", "c1"), ("dev", "c2")]);
        assert_eq!(
            reconciler.accept_commits(generation, map.clone(), no_refs()),
            CommitsOutcome::Classify(map.clone())
        );
        assert_eq!(reconciler.state(), ReconcileState::ClassifyingBranches);
        assert!(reconciler.relations().is_empty(), "nothing visible mid-cycle");

        let result = relations(&[("main", Relation::Same), ("dev", Relation::Ahead)]);
        assert!(reconciler.publish(generation, result.clone()));
        assert_eq!(reconciler.state(), ReconcileState::Ready);
        assert_eq!(reconciler.relations(), &result);
        assert_eq!(reconciler.commits(), &map);
        assert_eq!(reconciler.published_generation(), Some(generation));
    }

    #[test]
    fn test_stale_classification_is_discarded() {
        let mut reconciler = BranchReconciler::new();
        let first = reconciler.begin_fetch(CycleTrigger::Explicit);
        reconciler.accept_commits(first, commits(&[("main", "c1")]), no_refs());

        let second = reconciler.begin_fetch(CycleTrigger::Explicit);
        assert!(!reconciler.publish(first, relations(&[("main", Relation::Ahead)])));
        assert!(reconciler.relations().is_empty());

        reconciler.accept_commits(second, commits(&[("main", "c2")]), no_refs());
        assert!(reconciler.publish(second, relations(&[("main", Relation::Same)])));
        assert_eq!(reconciler.relations(), &relations(&[("main", Relation::Same)]));

        // A late first-cycle result never overwrites the second
        assert!(!reconciler.publish(first, relations(&[("main", Relation::Behind)])));
        assert_eq!(reconciler.relations(), &relations(&[("main", Relation::Same)]));
    }

    #[test]
    fn test_stale_commit_map_is_discarded() {
        let mut reconciler = BranchReconciler::new();
        let first = reconciler.begin_fetch(CycleTrigger::Explicit);
        let second = reconciler.begin_fetch(CycleTrigger::Explicit);

        assert_eq!(
            reconciler.accept_commits(first, commits(&[("main", "c1")]), no_refs()),
            CommitsOutcome::Stale
        );
        assert_eq!(reconciler.state(), ReconcileState::FetchingCommits);
        assert!(matches!(
            reconciler.accept_commits(second, commits(&[("main", "c2")]), no_refs()),
            CommitsOutcome::Classify(_)
        ));
    }

    #[test]
    fn test_publish_matches_commit_key_set() {
        let mut reconciler = BranchReconciler::new();
        let generation = reconciler.begin_fetch(CycleTrigger::Explicit);
        reconciler.accept_commits(generation, commits(&[("main", "c1"), ("dev", "c2")]), no_refs());

        let partial = relations(&[("main", Relation::Ahead), ("ghost", Relation::Same)]);
        assert!(reconciler.publish(generation, partial));
        assert_eq!(
            reconciler.relations(),
            &relations(&[("dev", Relation::Null), ("main", Relation::Ahead)])
        );
    }

    #[test]
    fn test_fetch_failure_keeps_last_known_good() {
        let mut reconciler = BranchReconciler::new();
        let first = reconciler.begin_fetch(CycleTrigger::Explicit);
        assert!(reconciler.fetch_failed(first));
        assert_eq!(reconciler.state(), ReconcileState::Idle);

        let second = reconciler.begin_fetch(CycleTrigger::Explicit);
        reconciler.accept_commits(second, commits(&[("main", "c1")]), no_refs());
        reconciler.publish(second, relations(&[("main", Relation::Same)]));

        let third = reconciler.begin_fetch(CycleTrigger::Explicit);
        assert!(reconciler.fetch_failed(third));
        assert_eq!(reconciler.state(), ReconcileState::Ready);
        assert_eq!(reconciler.relations(), &relations(&[("main", Relation::Same)]));
        assert!(!reconciler.fetch_failed(second), "stale failures are ignored");
    }

    #[test]
    fn test_poll_with_unchanged_commits_skips_classification() {
        let mut reconciler = BranchReconciler::new();
        let map = commits(&[("main", "c1")]);
        let first = reconciler.begin_fetch(CycleTrigger::Explicit);
        reconciler.accept_commits(first, map.clone(), no_refs());
        reconciler.publish(first, relations(&[("main", Relation::Same)]));

        let poll = reconciler.begin_fetch(CycleTrigger::Poll);
        assert_eq!(
            reconciler.accept_commits(poll, map.clone(), no_refs()),
            CommitsOutcome::Unchanged
        );
        assert_eq!(reconciler.state(), ReconcileState::Ready);
        assert_eq!(reconciler.published_generation(), Some(first));

        let poll = reconciler.begin_fetch(CycleTrigger::Poll);
        let moved = commits(&[("main", "c2")]);
        assert_eq!(
            reconciler.accept_commits(poll, moved.clone(), no_refs()),
            CommitsOutcome::Classify(moved)
        );
    }

    #[test]
    fn test_explicit_refresh_reclassifies_unchanged_commits() {
        let mut reconciler = BranchReconciler::new();
        let map = commits(&[("main", "c1")]);
        let result = relations(&[("main", Relation::Ahead)]);

        let first = reconciler.begin_fetch(CycleTrigger::Explicit);
        reconciler.accept_commits(first, map.clone(), no_refs());
        reconciler.publish(first, result.clone());
        let before = reconciler.relations().clone();

        let second = reconciler.begin_fetch(CycleTrigger::Explicit);
        assert!(matches!(
            reconciler.accept_commits(second, map, no_refs()),
            CommitsOutcome::Classify(_)
        ));
        reconciler.publish(second, result);
        assert_eq!(reconciler.relations(), &before);
    }

    #[test]
    fn test_empty_branch_map_publishes_empty_relations() {
        let mut reconciler = BranchReconciler::new();
        let generation = reconciler.begin_fetch(CycleTrigger::Explicit);
        reconciler.accept_commits(generation, BranchCommitMap::new(), no_refs());
        assert!(reconciler.publish(generation, BranchRelationMap::new()));
        assert_eq!(reconciler.state(), ReconcileState::Ready);
        assert!(reconciler.relations().is_empty());
    }

    #[test]
    fn test_poll_reclassifies_when_reference_moves() {
        let mut reconciler = BranchReconciler::new();
        let map = commits(&[("main", "c1")]);
        let first = reconciler.begin_fetch(CycleTrigger::Explicit);
        reconciler.accept_commits(first, map.clone(), commits(&[("main", "c1")]));
        reconciler.publish(first, relations(&[("main", Relation::Same)]));

        let poll = reconciler.begin_fetch(CycleTrigger::Poll);
        assert_eq!(
            reconciler.accept_commits(poll, map.clone(), commits(&[("main", "c1")])),
            CommitsOutcome::Unchanged
        );

        // Upstream advanced while the local branch stayed put
        let poll = reconciler.begin_fetch(CycleTrigger::Poll);
        assert_eq!(
            reconciler.accept_commits(poll, map.clone(), commits(&[("main", "c2")])),
            CommitsOutcome::Classify(map)
        );
        assert!(reconciler.publish(poll, relations(&[("main", Relation::Behind)])));
        assert_eq!(reconciler.relations(), &relations(&[("main", Relation::Behind)]));

        // Losing the upstream is a change too
        let poll = reconciler.begin_fetch(CycleTrigger::Poll);
        assert!(matches!(
            reconciler.accept_commits(poll, commits(&[("main", "c1")]), no_refs()),
            CommitsOutcome::Classify(_)
        ));
    }
}
