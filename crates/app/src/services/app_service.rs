use anyhow::Result;
use repodeck_core::app::{settle, Command, CycleTrigger, Effect, ReadProjection, RegistrySnapshot};
use repodeck_core::domain::{
    BranchCommitMap, BranchRelationMap, Event, Generation, Lookup, ProjectId,
};
use repodeck_core::error::ServiceResult;
use repodeck_core::ports::{Clock, RepositoryInspector};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// The application service that drives the project list and every project's
/// reconciliation. It talks to the inspection service through its port and
/// applies all results on one loop via the event bus.
pub struct AppService {
    // Ports
    inspector: Arc<dyn RepositoryInspector>,
    clock: Arc<dyn Clock>,

    // Event bus
    event_tx: mpsc::UnboundedSender<Event>,
    event_rx: mpsc::UnboundedReceiver<Event>,

    // Command receiver
    command_rx: mpsc::UnboundedReceiver<Command>,

    // Latest snapshot for presentation
    snapshot_tx: watch::Sender<RegistrySnapshot>,

    // Read projection, only mutated on this loop
    projection: ReadProjection,

    // Background task management
    tasks: JoinSet<Result<()>>,

    quit_requested: bool,
}

impl AppService {
    pub fn new(
        inspector: Arc<dyn RepositoryInspector>,
        clock: Arc<dyn Clock>,
    ) -> (
        Self,
        watch::Receiver<RegistrySnapshot>,
        mpsc::UnboundedSender<Command>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(RegistrySnapshot::default());

        let service = Self {
            inspector,
            clock,
            event_tx,
            event_rx,
            command_rx,
            snapshot_tx,
            projection: ReadProjection::new(),
            tasks: JoinSet::new(),
            quit_requested: false,
        };

        (service, snapshot_rx, command_tx)
    }

    /// Get the current read projection
    pub fn projection(&self) -> &ReadProjection {
        &self.projection
    }

    pub fn subscribe(&self) -> watch::Receiver<RegistrySnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Handle a command (CQRS Command side)
    pub async fn handle_command(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Refresh => self.start_refresh(),
            Command::RefreshProject { id } => {
                let generation = self
                    .projection
                    .begin_reconcile(&id, CycleTrigger::Explicit)?;
                info!("Refreshing project {} ({})", id, generation);
                self.load_project(id, generation);
            }
            Command::Poll => {
                let settled = self.projection.settled_project_ids();
                debug!("Polling {} settled projects", settled.len());
                for id in settled {
                    let generation = self.projection.begin_reconcile(&id, CycleTrigger::Poll)?;
                    self.spawn_change_count(id.clone());
                    self.spawn_commit_fetch(id, generation);
                }
            }
            Command::Quit => {
                info!("Quit command received");
                let _ = self.event_tx.send(Event::QuitRequested);
            }
        }

        self.publish_snapshot();
        Ok(())
    }

    /// Resync then list, at most one refresh in flight
    fn start_refresh(&mut self) {
        if let Err(e) = self.projection.begin_refresh() {
            debug!("Ignoring refresh request: {}", e);
            return;
        }

        info!("Refreshing project list");
        let inspector = self.inspector.clone();
        let clock = self.clock.clone();
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            let event = match list_projects(inspector.as_ref()).await {
                Ok(ids) => Event::ProjectsListed {
                    ids,
                    at: clock.now(),
                },
                Err(e) => {
                    error!("Project list refresh failed: {}", e);
                    Event::RefreshFailed { msg: e.to_string() }
                }
            };
            let _ = event_tx.send(event);
            Ok(())
        });
    }

    fn spawn_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadProject { id, generation } => self.load_project(id, generation),
                Effect::Classify {
                    id,
                    generation,
                    commits,
                } => self.spawn_classification(id, generation, commits),
            }
        }
    }

    /// Identity, change count and the commit fetch, all issued concurrently
    fn load_project(&mut self, id: ProjectId, generation: Generation) {
        self.spawn_remote_name(id.clone());
        self.spawn_local_name(id.clone());
        self.spawn_change_count(id.clone());
        self.spawn_commit_fetch(id, generation);
    }

    fn spawn_remote_name(&mut self, id: ProjectId) {
        let inspector = self.inspector.clone();
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            let event = match inspector.remote_name(&id).await {
                Ok(name) => Event::RemoteNameLoaded { id, name },
                Err(e) => Event::LookupFailed {
                    msg: format!("{} failed: {}", Lookup::RemoteName, e),
                    lookup: Lookup::RemoteName,
                    id,
                },
            };
            let _ = event_tx.send(event);
            Ok(())
        });
    }

    fn spawn_local_name(&mut self, id: ProjectId) {
        let inspector = self.inspector.clone();
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            let event = match inspector.local_name(&id).await {
                Ok(name) => Event::LocalNameLoaded { id, name },
                Err(e) => Event::LookupFailed {
                    msg: format!("{} failed: {}", Lookup::LocalName, e),
                    lookup: Lookup::LocalName,
                    id,
                },
            };
            let _ = event_tx.send(event);
            Ok(())
        });
    }

    fn spawn_change_count(&mut self, id: ProjectId) {
        let inspector = self.inspector.clone();
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            let event = match inspector.change_count(&id).await {
                Ok(count) => Event::ChangeCountLoaded { id, count },
                Err(e) => Event::LookupFailed {
                    msg: format!("{} failed: {}", Lookup::ChangeCount, e),
                    lookup: Lookup::ChangeCount,
                    id,
                },
            };
            let _ = event_tx.send(event);
            Ok(())
        });
    }

    fn spawn_commit_fetch(&mut self, id: ProjectId, generation: Generation) {
        let inspector = self.inspector.clone();
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            let fetched = match inspector.branch_commit_map(&id).await {
                Ok(commits) => inspector
                    .reference_commit_map(&id)
                    .await
                    .map(|references| (commits, references)),
                Err(e) => Err(e),
            };
            let event = match fetched {
                Ok((commits, references)) => Event::CommitsFetched {
                    id,
                    generation,
                    commits,
                    references,
                },
                Err(e) => {
                    warn!("Fetching branches of {} failed: {}", id, e);
                    Event::CommitsFetchFailed {
                        id,
                        generation,
                        msg: format!("Branch lookup failed: {}", e),
                    }
                }
            };
            let _ = event_tx.send(event);
            Ok(())
        });
    }

    /// Classify every branch of one generation and report them as one batch
    fn spawn_classification(
        &mut self,
        id: ProjectId,
        generation: Generation,
        commits: BranchCommitMap,
    ) {
        let inspector = self.inspector.clone();
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            let mut branches = JoinSet::new();
            for (branch, current) in commits {
                let inspector = inspector.clone();
                let id = id.clone();
                branches.spawn(async move {
                    let outcome = inspector.classify_relation(&id, &branch, &current).await;
                    let relation = settle(&branch, outcome);
                    (branch, relation)
                });
            }

            let mut relations = BranchRelationMap::new();
            while let Some(joined) = branches.join_next().await {
                match joined {
                    Ok((branch, relation)) => {
                        relations.insert(branch, relation);
                    }
                    // The branch is published as Null
                    Err(e) => error!("Classification task for {} failed: {}", id, e),
                }
            }

            let _ = event_tx.send(Event::BranchesClassified {
                id,
                generation,
                relations,
            });
            Ok(())
        });
    }

    /// Handle a single event and update the read projection
    pub async fn handle_event(&mut self, event: Event) -> Result<()> {
        match &event {
            Event::ProjectsListed { ids, .. } => info!("Listed {} projects", ids.len()),
            Event::RefreshFailed { msg } => warn!("Keeping previous project list: {}", msg),
            Event::BranchesClassified {
                id,
                generation,
                relations,
            } => debug!(
                "Classified {} branches of {} ({})",
                relations.len(),
                id,
                generation
            ),
            Event::LookupFailed { id, msg, .. } => warn!("Keeping previous value for {}: {}", id, msg),
            Event::Error { id: Some(id), msg } => warn!("Project error for {}: {}", id, msg),
            Event::Error { id: None, msg } => error!("Application error: {}", msg),
            Event::QuitRequested => {
                info!("Quit requested via event");
                self.quit_requested = true;
            }
            _ => debug!("Applying {:?}", event),
        }

        let effects = self.projection.apply(&event);
        self.spawn_effects(effects);
        self.publish_snapshot();
        Ok(())
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(self.projection.snapshot());
    }

    fn log_task_result(&self, joined: std::result::Result<Result<()>, JoinError>) {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Background task failed: {:#}", e),
            Err(e) => error!("Background task panicked: {}", e),
        }
    }

    /// Process one pending event or task completion.
    /// Returns false once nothing is queued and no task is running.
    pub async fn pump(&mut self) -> bool {
        if let Ok(event) = self.event_rx.try_recv() {
            if let Err(e) = self.handle_event(event).await {
                error!("Error handling event: {:#}", e);
            }
            return true;
        }

        if self.tasks.is_empty() {
            return false;
        }

        tokio::select! {
            Some(event) = self.event_rx.recv() => {
                if let Err(e) = self.handle_event(event).await {
                    error!("Error handling event: {:#}", e);
                }
            }
            Some(joined) = self.tasks.join_next() => self.log_task_result(joined),
        }
        true
    }

    /// Drive everything in flight to completion
    pub async fn run_until_idle(&mut self) {
        while self.pump().await {}
    }

    /// Main loop: initial refresh, commands, events, task completions and
    /// optional periodic polls, until quit or the command channel closes
    pub async fn run(&mut self, poll_interval: Option<Duration>) -> Result<()> {
        info!("Starting AppService");
        self.handle_command(Command::Refresh).await?;

        let mut poll = poll_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(cmd) => {
                            if let Err(e) = self.handle_command(cmd).await {
                                error!("Error handling command: {:#}", e);
                            }
                        }
                        None => {
                            info!("Command channel closed");
                            break;
                        }
                    }
                }

                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.handle_event(event).await {
                        error!("Error handling event: {:#}", e);
                    }
                }

                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.log_task_result(joined);
                }

                _ = next_tick(&mut poll) => {
                    if let Err(e) = self.handle_command(Command::Poll).await {
                        error!("Error polling projects: {:#}", e);
                    }
                }
            }

            if self.quit_requested {
                break;
            }
        }

        info!("Shutting down background tasks");
        self.tasks.abort_all();
        Ok(())
    }
}

async fn list_projects(inspector: &dyn RepositoryInspector) -> ServiceResult<Vec<ProjectId>> {
    inspector.resync_project_set().await?;
    inspector.list_project_ids().await
}

async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
