use super::reconciler::{BranchReconciler, CommitsOutcome, CycleTrigger, ReconcileState};
use crate::domain::{
    BranchCommitMap, BranchRelationMap, ChangeStatus, Generation, Lookup, ProjectId,
    ProjectIdentity,
};

/// What an outstanding error was reported by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorSource {
    Lookup(Lookup),
    Branches,
    Other,
}

/// View-model of a single project.
///
/// Owns the project's reconciler, identity and change count exclusively;
/// it is only ever mutated through the read projection.
#[derive(Debug, Clone)]
pub struct ProjectView {
    id: ProjectId,
    identity: ProjectIdentity,
    change_count: Option<usize>,
    reconciler: BranchReconciler,
    /// Unresolved errors, oldest first, at most one per source
    errors: Vec<(ErrorSource, String)>,
}

impl ProjectView {
    pub fn new(id: ProjectId) -> Self {
        Self {
            id,
            identity: ProjectIdentity::default(),
            change_count: None,
            reconciler: BranchReconciler::new(),
            errors: Vec::new(),
        }
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn identity(&self) -> &ProjectIdentity {
        &self.identity
    }

    /// Relations of the latest complete cycle, empty before the first
    pub fn branch_relations(&self) -> &BranchRelationMap {
        self.reconciler.relations()
    }

    /// Commit map the current relations were derived from
    pub fn commits(&self) -> &BranchCommitMap {
        self.reconciler.commits()
    }

    pub fn change_status(&self) -> ChangeStatus {
        ChangeStatus::from_count(self.change_count)
    }

    pub fn change_count(&self) -> Option<usize> {
        self.change_count
    }

    pub fn reconcile_state(&self) -> ReconcileState {
        self.reconciler.state()
    }

    pub fn reconciler(&self) -> &BranchReconciler {
        &self.reconciler
    }

    /// Most recent non-fatal error that no later success has cleared
    pub fn last_error(&self) -> Option<&str> {
        self.errors.last().map(|(_, msg)| msg.as_str())
    }

    fn set_error(&mut self, source: ErrorSource, msg: String) {
        self.clear_error(source);
        self.errors.push((source, msg));
    }

    fn clear_error(&mut self, source: ErrorSource) {
        self.errors.retain(|(s, _)| *s != source);
    }

    pub(crate) fn set_remote_name(&mut self, name: Option<String>) {
        self.identity.remote_name = name;
        self.clear_error(ErrorSource::Lookup(Lookup::RemoteName));
    }

    pub(crate) fn set_local_name(&mut self, name: Option<String>) {
        self.identity.local_name = name;
        self.clear_error(ErrorSource::Lookup(Lookup::LocalName));
    }

    pub(crate) fn set_change_count(&mut self, count: usize) {
        self.change_count = Some(count);
        self.clear_error(ErrorSource::Lookup(Lookup::ChangeCount));
    }

    /// The lookup's field keeps its previous value
    pub(crate) fn lookup_failed(&mut self, lookup: Lookup, msg: String) {
        self.set_error(ErrorSource::Lookup(lookup), msg);
    }

    pub(crate) fn record_error(&mut self, msg: String) {
        self.set_error(ErrorSource::Other, msg);
    }

    pub(crate) fn begin_reconcile(&mut self, trigger: CycleTrigger) -> Generation {
        self.reconciler.begin_fetch(trigger)
    }

    pub(crate) fn accept_commits(
        &mut self,
        generation: Generation,
        commits: BranchCommitMap,
        references: BranchCommitMap,
    ) -> CommitsOutcome {
        let outcome = self
            .reconciler
            .accept_commits(generation, commits, references);
        if outcome == CommitsOutcome::Unchanged {
            self.clear_error(ErrorSource::Branches);
        }
        outcome
    }

    pub(crate) fn fetch_failed(&mut self, generation: Generation, msg: String) {
        if self.reconciler.fetch_failed(generation) {
            self.set_error(ErrorSource::Branches, msg);
        }
    }

    pub(crate) fn publish(&mut self, generation: Generation, relations: BranchRelationMap) -> bool {
        let published = self.reconciler.publish(generation, relations);
        if published {
            self.clear_error(ErrorSource::Branches);
        }
        published
    }
}
