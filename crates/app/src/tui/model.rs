use repodeck_core::app::{ProjectSnapshot, RegistrySnapshot};
use repodeck_core::domain::ProjectId;

/// The TUI Model - the complete UI state.
/// Project data is a read-only snapshot published by the application service.
#[derive(Debug, Default)]
pub struct TuiModel {
    /// Latest registry snapshot
    pub snapshot: RegistrySnapshot,

    /// UI-specific state
    pub ui_state: UiState,

    /// Current view mode
    pub mode: ViewMode,

    /// Error messages to display
    pub errors: Vec<String>,

    /// Status messages to display
    pub messages: Vec<String>,

    /// Whether the application should quit
    pub should_quit: bool,
}

/// UI-specific state (cursor position, terminal size, display options)
#[derive(Debug, Default)]
pub struct UiState {
    /// Index of the selected project card
    pub cursor_position: usize,

    /// Terminal size
    pub terminal_width: u16,
    pub terminal_height: u16,

    /// Show short commit ids in the details view
    pub show_commit_ids: bool,
}

/// Different view modes for the TUI
#[derive(Debug, Default, Clone, PartialEq)]
pub enum ViewMode {
    /// One card per project
    #[default]
    ProjectList,

    /// Per-branch commits and relations of one project
    ProjectDetails { id: ProjectId },

    Help,
}

const MAX_MESSAGES: usize = 5;

impl TuiModel {
    pub fn new(show_commit_ids: bool) -> Self {
        Self {
            ui_state: UiState {
                show_commit_ids,
                ..UiState::default()
            },
            ..Self::default()
        }
    }

    /// Replace the snapshot and keep UI state consistent with it
    pub fn update_snapshot(&mut self, snapshot: RegistrySnapshot) {
        if snapshot.last_error != self.snapshot.last_error {
            if let Some(error) = &snapshot.last_error {
                self.add_error(format!("Refresh failed: {}", error));
            }
        }
        if self.snapshot.refreshing && !snapshot.refreshing && snapshot.last_error.is_none() {
            self.add_message(format!("Found {} projects", snapshot.projects.len()));
        }

        self.snapshot = snapshot;

        let count = self.snapshot.projects.len();
        if self.ui_state.cursor_position >= count {
            self.ui_state.cursor_position = count.saturating_sub(1);
        }

        let dropped = match &self.mode {
            ViewMode::ProjectDetails { id } if self.snapshot.project(id).is_none() => {
                Some(id.clone())
            }
            _ => None,
        };
        if let Some(id) = dropped {
            self.add_message(format!("Project {} is no longer listed", id));
            self.mode = ViewMode::ProjectList;
        }
    }

    /// Project under the cursor
    pub fn selected_project(&self) -> Option<&ProjectSnapshot> {
        self.snapshot.projects.get(self.ui_state.cursor_position)
    }

    pub fn move_up(&mut self) {
        self.ui_state.cursor_position = self.ui_state.cursor_position.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.ui_state.cursor_position + 1 < self.snapshot.projects.len() {
            self.ui_state.cursor_position += 1;
        }
    }

    /// Clear all error messages
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Add a status message, keeping only the most recent ones
    pub fn add_message(&mut self, message: String) {
        self.messages.push(message);
        if self.messages.len() > MAX_MESSAGES {
            self.messages.remove(0);
        }
    }

    /// Add an error message
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}
