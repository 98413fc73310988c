// Composition root: wires adapters, the application service and the TUI

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use repodeck_core::app::{Command, RegistrySnapshot};
use repodeck_core::ports::{
    AppConfig, ConfigStore, DiscoveryPort, ReferencePolicy, RepositoryInspector, SystemClock,
};
use std::fmt::Write as _;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::adapters::{FileConfigStore, FsDiscoveryAdapter, GitInspector, GithubCatalog};
use crate::cli::CliArgs;
use crate::services::AppService;
use crate::tui::format::{change_label, identity_label, relation_label};
use crate::tui::{TuiMessage, TuiModel, TuiUpdate, TuiView};

/// The application: service, snapshot feed and command channel
pub struct RepodeckApp {
    app_service: AppService,
    snapshot_rx: watch::Receiver<RegistrySnapshot>,
    command_tx: mpsc::UnboundedSender<Command>,
    config: AppConfig,
}

impl RepodeckApp {
    /// Build the application from CLI arguments and the config file
    pub fn new(cli_args: &CliArgs) -> Result<Self> {
        let config = load_config(cli_args)?;
        Ok(Self::from_config(config))
    }

    /// Dependency injection happens here
    pub fn from_config(config: AppConfig) -> Self {
        for dir in &config.project_dirs {
            info!("Tracking projects in {}", dir.display());
        }

        let discovery: Arc<dyn DiscoveryPort> = Arc::new(FsDiscoveryAdapter::new());
        let mut git_inspector = GitInspector::new(
            discovery,
            config.project_dirs.clone(),
            config.scan.max_depth,
            config.reference.clone(),
        );
        if let Some(token) = &config.hosting.token {
            match GithubCatalog::new(&config.hosting.api_url, token) {
                Ok(catalog) => {
                    info!("Listing hosted repositories from {}", catalog.api_url());
                    git_inspector = git_inspector.with_catalog(Arc::new(catalog));
                }
                Err(e) => error!("Hosted repositories disabled: {:#}", e),
            }
        } else if config.reference == ReferencePolicy::Hosted {
            warn!("Hosted reference policy without a token; every branch will be unrelated");
        }
        let inspector: Arc<dyn RepositoryInspector> = Arc::new(git_inspector);

        let (app_service, snapshot_rx, command_tx) =
            AppService::new(inspector, Arc::new(SystemClock));

        Self {
            app_service,
            snapshot_rx,
            command_tx,
            config,
        }
    }

    /// Refresh once, wait for every project to settle and return a report
    pub async fn run_once(mut self) -> Result<String> {
        self.app_service.handle_command(Command::Refresh).await?;
        self.app_service.run_until_idle().await;
        Ok(render_report(&self.app_service.projection().snapshot()))
    }

    /// Run the interactive terminal UI
    pub async fn run_tui(self) -> Result<()> {
        info!("Starting repodeck TUI");

        let RepodeckApp {
            mut app_service,
            snapshot_rx,
            command_tx,
            config,
        } = self;

        let poll_interval = config.poll_interval();
        let app_service_handle =
            tokio::spawn(async move { app_service.run(poll_interval).await });

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let mut tui_model = TuiModel::new(config.ui.show_commit_ids);
        let result = run_main_loop(&mut tui_model, &mut terminal, snapshot_rx, &command_tx).await;

        shutdown(&mut terminal)?;

        let _ = command_tx.send(Command::Quit);
        match app_service_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("App service failed: {:#}", e),
            Err(e) => error!("App service task failed: {:?}", e),
        }

        result
    }
}

/// Load the config file and apply CLI overrides
pub fn load_config(cli_args: &CliArgs) -> Result<AppConfig> {
    let config_store = match &cli_args.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new()?,
    };

    let mut config = config_store
        .load()
        .with_context(|| format!("Failed to load config from {}", config_store.path().display()))?;

    if !cli_args.project_dirs.is_empty() {
        config.project_dirs = cli_args.project_dirs.clone();
    }
    if config.project_dirs.is_empty() {
        let home = dirs::home_dir().context("No project directory configured and no home directory")?;
        config.project_dirs = vec![home];
    }
    if config.hosting.token.is_none() {
        config.hosting.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
    }

    Ok(config)
}

/// Main application loop - snapshots in, key presses out
async fn run_main_loop(
    tui_model: &mut TuiModel,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut snapshot_rx: watch::Receiver<RegistrySnapshot>,
    command_tx: &mpsc::UnboundedSender<Command>,
) -> Result<()> {
    let mut needs_redraw = true;

    loop {
        if snapshot_rx.has_changed().unwrap_or(false) {
            let snapshot = snapshot_rx.borrow_and_update().clone();
            tui_model.update_snapshot(snapshot);
            needs_redraw = true;
        }

        if event::poll(Duration::from_millis(25))? {
            match event::read()? {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    let message =
                        TuiUpdate::handle_key(tui_model, key_event.code, key_event.modifiers)?;

                    if let TuiMessage::Command(cmd) = message {
                        if matches!(cmd, Command::Quit) {
                            tui_model.should_quit = true;
                        } else if let Err(e) = command_tx.send(cmd) {
                            error!("Failed to send command: {}", e);
                        }
                    }
                    needs_redraw = true;
                }
                Event::Resize(width, height) => {
                    TuiUpdate::handle_resize(tui_model, width, height)?;
                    needs_redraw = true;
                }
                _ => {}
            }
        }

        if tui_model.should_quit {
            info!("Quit requested, exiting main loop");
            break;
        }

        if needs_redraw {
            terminal.draw(|frame| TuiView::render(tui_model, frame))?;
            needs_redraw = false;
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}

/// Restore the terminal
fn shutdown(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    info!("Shutting down repodeck");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

/// Plain-text report of a settled registry
pub fn render_report(snapshot: &RegistrySnapshot) -> String {
    let mut out = String::new();

    if let Some(error) = &snapshot.last_error {
        let _ = writeln!(out, "refresh failed: {}", error);
    }
    if snapshot.projects.is_empty() {
        out.push_str("no projects found\n");
    }

    for project in &snapshot.projects {
        let _ = writeln!(
            out,
            "{} [{}]",
            identity_label(&project.identity),
            change_label(project.change_status, project.change_count)
        );
        for (branch, relation) in &project.relations {
            let commit = project
                .commits
                .get(branch)
                .map(|c| c.short())
                .unwrap_or("-");
            let _ = writeln!(out, "  {} {} {}", branch, commit, relation_label(*relation));
        }
        if let Some(error) = &project.last_error {
            let _ = writeln!(out, "  error: {}", error);
        }
    }

    out
}

/// Binary entry point
pub async fn main_entry() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli_args = CliArgs::parse();
    let app = RepodeckApp::new(&cli_args)?;

    if cli_args.once {
        print!("{}", app.run_once().await?);
        return Ok(());
    }

    app.run_tui().await?;
    info!("repodeck shut down cleanly");
    Ok(())
}
