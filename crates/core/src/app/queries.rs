use super::project_list::ProjectList;
use super::project_view::ProjectView;
use super::reconciler::{CommitsOutcome, CycleTrigger, ReconcileState};
use crate::domain::{
    BranchCommitMap, BranchRelationMap, ChangeStatus, Event, Generation, ProjectId,
    ProjectIdentity,
};
use crate::error::{CoreError, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Follow-up work the service must start after applying an event
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch identity and change count, and the commit map of `generation`
    LoadProject { id: ProjectId, generation: Generation },

    /// Classify every branch of `commits` for `generation`
    Classify {
        id: ProjectId,
        generation: Generation,
        commits: BranchCommitMap,
    },
}

/// Owned, keyed collection of project view-models plus the project list.
/// The only place per-project state is mutated.
#[derive(Debug, Default)]
pub struct ReadProjection {
    projects: HashMap<ProjectId, ProjectView>,
    list: ProjectList,
}

impl ReadProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &ProjectList {
        &self.list
    }

    pub fn project(&self, id: &ProjectId) -> Option<&ProjectView> {
        self.projects.get(id)
    }

    /// Project views in listing order
    pub fn projects(&self) -> impl Iterator<Item = &ProjectView> {
        self.list.ids().iter().filter_map(|id| self.projects.get(id))
    }

    /// Claim the refresh slot; fails while a refresh is in flight
    pub fn begin_refresh(&mut self) -> Result<()> {
        self.list.try_begin_refresh()
    }

    /// Start a new reconciliation cycle for one project
    pub fn begin_reconcile(&mut self, id: &ProjectId, trigger: CycleTrigger) -> Result<Generation> {
        let view = self
            .projects
            .get_mut(id)
            .ok_or_else(|| CoreError::ProjectNotFound { id: id.to_string() })?;
        Ok(view.begin_reconcile(trigger))
    }

    /// Projects with no reconciliation cycle in flight
    pub fn settled_project_ids(&self) -> Vec<ProjectId> {
        self.projects()
            .filter(|view| !view.reconciler().is_busy())
            .map(|view| view.id().clone())
            .collect()
    }

    /// Apply an event and return the work it triggers
    pub fn apply(&mut self, event: &Event) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            Event::ProjectsListed { ids, at } => {
                self.list.finish(ids.clone(), *at);

                let listed: HashSet<&ProjectId> = ids.iter().collect();
                self.projects.retain(|id, _| listed.contains(id));

                for id in ids {
                    let view = self
                        .projects
                        .entry(id.clone())
                        .or_insert_with(|| ProjectView::new(id.clone()));
                    let generation = view.begin_reconcile(CycleTrigger::Explicit);
                    effects.push(Effect::LoadProject {
                        id: id.clone(),
                        generation,
                    });
                }
            }

            Event::RefreshFailed { msg } => {
                self.list.fail(msg.clone());
            }

            Event::RemoteNameLoaded { id, name } => {
                if let Some(view) = self.project_mut(id) {
                    view.set_remote_name(name.clone());
                }
            }

            Event::LocalNameLoaded { id, name } => {
                if let Some(view) = self.project_mut(id) {
                    view.set_local_name(name.clone());
                }
            }

            Event::ChangeCountLoaded { id, count } => {
                if let Some(view) = self.project_mut(id) {
                    view.set_change_count(*count);
                }
            }

            Event::LookupFailed { id, lookup, msg } => {
                if let Some(view) = self.project_mut(id) {
                    view.lookup_failed(*lookup, msg.clone());
                }
            }

            Event::CommitsFetched {
                id,
                generation,
                commits,
                references,
            } => {
                if let Some(view) = self.project_mut(id) {
                    if let CommitsOutcome::Classify(commits) =
                        view.accept_commits(*generation, commits.clone(), references.clone())
                    {
                        effects.push(Effect::Classify {
                            id: id.clone(),
                            generation: *generation,
                            commits,
                        });
                    }
                }
            }

            Event::CommitsFetchFailed {
                id,
                generation,
                msg,
            } => {
                if let Some(view) = self.project_mut(id) {
                    view.fetch_failed(*generation, msg.clone());
                }
            }

            Event::BranchesClassified {
                id,
                generation,
                relations,
            } => {
                if let Some(view) = self.project_mut(id) {
                    view.publish(*generation, relations.clone());
                }
            }

            Event::Error { id: Some(id), msg } => {
                if let Some(view) = self.project_mut(id) {
                    view.record_error(msg.clone());
                }
            }

            Event::Error { id: None, .. } | Event::QuitRequested => {}
        }

        effects
    }

    /// Immutable copy of everything presentation needs
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            projects: self.projects().map(ProjectSnapshot::from).collect(),
            refreshing: self.list.is_refreshing(),
            refreshed_at: self.list.refreshed_at(),
            last_error: self.list.last_error().map(str::to_string),
        }
    }

    fn project_mut(&mut self, id: &ProjectId) -> Option<&mut ProjectView> {
        let view = self.projects.get_mut(id);
        if view.is_none() {
            debug!("Ignoring event for unlisted project {}", id);
        }
        view
    }
}

/// Read-only view of the whole registry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrySnapshot {
    /// One entry per listed project, in listing order
    pub projects: Vec<ProjectSnapshot>,
    /// A refresh is in flight; refresh controls should be disabled
    pub refreshing: bool,
    pub refreshed_at: Option<i64>,
    pub last_error: Option<String>,
}

impl RegistrySnapshot {
    pub fn ids(&self) -> Vec<&ProjectId> {
        self.projects.iter().map(|p| &p.id).collect()
    }

    pub fn project(&self, id: &ProjectId) -> Option<&ProjectSnapshot> {
        self.projects.iter().find(|p| &p.id == id)
    }
}

/// Read-only view of one project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub id: ProjectId,
    pub identity: ProjectIdentity,
    pub change_status: ChangeStatus,
    pub change_count: Option<usize>,
    pub commits: BranchCommitMap,
    pub relations: BranchRelationMap,
    pub state: ReconcileState,
    pub last_error: Option<String>,
}

impl From<&ProjectView> for ProjectSnapshot {
    fn from(view: &ProjectView) -> Self {
        Self {
            id: view.id().clone(),
            identity: view.identity().clone(),
            change_status: view.change_status(),
            change_count: view.change_count(),
            commits: view.commits().clone(),
            relations: view.branch_relations().clone(),
            state: view.reconcile_state(),
            last_error: view.last_error().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitId, Lookup, Relation};

    fn listed(ids: &[&str]) -> Event {
        Event::ProjectsListed {
            ids: ids.iter().map(|id| ProjectId::from(*id)).collect(),
            at: 42,
        }
    }

    fn generation_of(effects: &[Effect], project: &str) -> Generation {
        effects
            .iter()
            .find_map(|effect| match effect {
                Effect::LoadProject { id, generation } if id.0 == project => Some(*generation),
                _ => None,
            })
            .expect("project was loaded")
    }

    #[test]
    fn test_listing_creates_and_loads_projects() {
        let mut projection = ReadProjection::new();
        projection.begin_refresh().unwrap();

        let effects = projection.apply(&listed(&["p1", "p2"]));
        assert_eq!(effects.len(), 2);

        let snapshot = projection.snapshot();
        assert_eq!(snapshot.ids(), vec![&ProjectId::from("p1"), &ProjectId::from("p2")]);
        assert!(!snapshot.refreshing);
        assert_eq!(snapshot.refreshed_at, Some(42));
        assert!(snapshot
            .projects
            .iter()
            .all(|p| p.state == ReconcileState::FetchingCommits));
    }

    #[test]
    fn test_relisting_drops_missing_projects() {
        let mut projection = ReadProjection::new();
        projection.apply(&listed(&["p1", "p2"]));
        projection.apply(&listed(&["p2"]));

        assert!(projection.project(&ProjectId::from("p1")).is_none());
        assert!(projection.project(&ProjectId::from("p2")).is_some());

        // Late results for the dropped project are ignored
        let effects = projection.apply(&Event::CommitsFetched {
            id: ProjectId::from("p1"),
            generation: Generation(1),
            commits: BranchCommitMap::new(),
            references: BranchCommitMap::new(),
        });
        assert!(effects.is_empty());
        assert_eq!(projection.snapshot().projects.len(), 1);
    }

    #[test]
    fn test_scenario_main_same_dev_ahead() {
        let mut projection = ReadProjection::new();
        let effects = projection.apply(&listed(&["p1"]));
        let generation = generation_of(&effects, "p1");
        let id = ProjectId::from("p1");

        let commits: BranchCommitMap = [
            ("main".to_string(), CommitId::from("c1")),
            ("dev".to_string(), CommitId::from("c2")),
        ]
        .into_iter()
        .collect();
        let effects = projection.apply(&Event::CommitsFetched {
            id: id.clone(),
            generation,
            commits: commits.clone(),
            references: BranchCommitMap::new(),
        });
        assert_eq!(
            effects,
            vec![Effect::Classify {
                id: id.clone(),
                generation,
                commits
            }]
        );

        let relations: BranchRelationMap = [
            ("main".to_string(), Relation::Same),
            ("dev".to_string(), Relation::Ahead),
        ]
        .into_iter()
        .collect();
        projection.apply(&Event::BranchesClassified {
            id: id.clone(),
            generation,
            relations: relations.clone(),
        });

        let view = projection.project(&id).unwrap();
        assert_eq!(view.branch_relations(), &relations);
        assert_eq!(view.reconcile_state(), ReconcileState::Ready);
    }

    #[test]
    fn test_identity_and_change_count_events() {
        let mut projection = ReadProjection::new();
        projection.apply(&listed(&["p1", "p2"]));
        let p1 = ProjectId::from("p1");

        projection.apply(&Event::RemoteNameLoaded {
            id: p1.clone(),
            name: Some("widget".to_string()),
        });
        projection.apply(&Event::ChangeCountLoaded {
            id: p1.clone(),
            count: 0,
        });
        projection.apply(&Event::RemoteNameLoaded {
            id: ProjectId::from("p2"),
            name: None,
        });
        projection.apply(&Event::LocalNameLoaded {
            id: ProjectId::from("p2"),
            name: None,
        });

        let snapshot = projection.snapshot();
        let first = snapshot.project(&p1).unwrap();
        assert_eq!(first.identity.remote_name.as_deref(), Some("widget"));
        assert_eq!(first.change_status, ChangeStatus::Clean);

        let second = snapshot.project(&ProjectId::from("p2")).unwrap();
        assert!(second.identity.is_unknown());
        assert_eq!(second.change_status, ChangeStatus::Unknown);
    }

    #[test]
    fn test_begin_reconcile_unknown_project() {
        let mut projection = ReadProjection::new();
        let result = projection.begin_reconcile(&ProjectId::from("nope"), CycleTrigger::Explicit);
        assert!(matches!(result, Err(CoreError::ProjectNotFound { .. })));
    }

    #[test]
    fn test_settled_projects_exclude_busy_ones() {
        let mut projection = ReadProjection::new();
        let effects = projection.apply(&listed(&["p1", "p2"]));
        assert!(projection.settled_project_ids().is_empty());

        let generation = generation_of(&effects, "p1");
        projection.apply(&Event::CommitsFetchFailed {
            id: ProjectId::from("p1"),
            generation,
            msg: "offline".to_string(),
        });
        assert_eq!(projection.settled_project_ids(), vec![ProjectId::from("p1")]);
        assert_eq!(
            projection.project(&ProjectId::from("p1")).unwrap().last_error(),
            Some("offline")
        );
    }

    #[test]
    fn test_failed_lookups_keep_previous_values() {
        let mut projection = ReadProjection::new();
        projection.apply(&listed(&["p1"]));
        let id = ProjectId::from("p1");

        projection.apply(&Event::RemoteNameLoaded {
            id: id.clone(),
            name: Some("widget".to_string()),
        });
        projection.apply(&Event::ChangeCountLoaded {
            id: id.clone(),
            count: 0,
        });
        projection.apply(&Event::LookupFailed {
            id: id.clone(),
            lookup: Lookup::RemoteName,
            msg: "Remote name lookup failed: offline".to_string(),
        });

        let snapshot = projection.snapshot();
        let project = snapshot.project(&id).unwrap();
        assert_eq!(project.identity.remote_name.as_deref(), Some("widget"));
        assert_eq!(project.change_status, ChangeStatus::Clean);
        assert_eq!(
            project.last_error.as_deref(),
            Some("Remote name lookup failed: offline")
        );
    }
}
