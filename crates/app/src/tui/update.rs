use super::model::{TuiModel, ViewMode};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use repodeck_core::app::Command;
use repodeck_core::domain::ProjectId;

/// Messages that can be sent from the TUI to the application service
#[derive(Debug, Clone, PartialEq)]
pub enum TuiMessage {
    /// Send a command to the app service
    Command(Command),

    /// No action needed
    None,
}

/// The Update function - handles user input and updates the model
pub struct TuiUpdate;

impl TuiUpdate {
    /// Handle a key press and update the model accordingly.
    /// Returns a TuiMessage that should be sent to the app service.
    pub fn handle_key(
        model: &mut TuiModel,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<TuiMessage> {
        if let Some(msg) = Self::handle_global_keys(model, key, modifiers)? {
            return Ok(msg);
        }

        match &model.mode {
            ViewMode::ProjectList => Self::handle_project_list_keys(model, key),
            ViewMode::ProjectDetails { id } => {
                let id = id.clone();
                Self::handle_project_details_keys(model, key, id)
            }
            ViewMode::Help => Self::handle_help_keys(model),
        }
    }

    /// Handle terminal resize
    pub fn handle_resize(model: &mut TuiModel, width: u16, height: u16) -> Result<TuiMessage> {
        model.ui_state.terminal_width = width;
        model.ui_state.terminal_height = height;
        Ok(TuiMessage::None)
    }

    /// Handle global keys that work in any mode
    fn handle_global_keys(
        model: &mut TuiModel,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<Option<TuiMessage>> {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                Ok(Some(TuiMessage::Command(Command::Quit)))
            }

            KeyCode::Char('q') if modifiers.is_empty() => {
                if matches!(model.mode, ViewMode::Help) {
                    model.mode = ViewMode::ProjectList;
                    Ok(Some(TuiMessage::None))
                } else {
                    Ok(Some(TuiMessage::Command(Command::Quit)))
                }
            }

            KeyCode::Esc => {
                if !model.errors.is_empty() {
                    model.clear_errors();
                    Ok(Some(TuiMessage::None))
                } else if model.mode != ViewMode::ProjectList {
                    model.mode = ViewMode::ProjectList;
                    Ok(Some(TuiMessage::None))
                } else {
                    Ok(Some(TuiMessage::Command(Command::Quit)))
                }
            }

            KeyCode::Char('?') if modifiers.is_empty() => {
                model.mode = ViewMode::Help;
                Ok(Some(TuiMessage::None))
            }

            KeyCode::F(5) => Ok(Some(Self::request_refresh(model))),
            KeyCode::Char('r') if modifiers.is_empty() => Ok(Some(Self::request_refresh(model))),

            _ => Ok(None),
        }
    }

    /// The refresh control is disabled while a refresh is in flight
    fn request_refresh(model: &mut TuiModel) -> TuiMessage {
        if model.snapshot.refreshing {
            model.add_message("Refresh already in progress".to_string());
            TuiMessage::None
        } else {
            TuiMessage::Command(Command::Refresh)
        }
    }

    /// Handle keys in the project list view
    fn handle_project_list_keys(model: &mut TuiModel, key: KeyCode) -> Result<TuiMessage> {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                model.move_up();
                Ok(TuiMessage::None)
            }

            KeyCode::Down | KeyCode::Char('j') => {
                model.move_down();
                Ok(TuiMessage::None)
            }

            KeyCode::Enter => {
                if let Some(id) = model.selected_project().map(|p| p.id.clone()) {
                    model.mode = ViewMode::ProjectDetails { id };
                }
                Ok(TuiMessage::None)
            }

            KeyCode::Char('u') => Ok(model
                .selected_project()
                .map(|project| {
                    TuiMessage::Command(Command::RefreshProject {
                        id: project.id.clone(),
                    })
                })
                .unwrap_or(TuiMessage::None)),

            _ => Ok(TuiMessage::None),
        }
    }

    /// Handle keys in the project details view
    fn handle_project_details_keys(
        model: &mut TuiModel,
        key: KeyCode,
        id: ProjectId,
    ) -> Result<TuiMessage> {
        match key {
            KeyCode::Char('u') => Ok(TuiMessage::Command(Command::RefreshProject { id })),

            KeyCode::Char('b') | KeyCode::Backspace => {
                model.mode = ViewMode::ProjectList;
                Ok(TuiMessage::None)
            }

            _ => Ok(TuiMessage::None),
        }
    }

    /// Any key closes help
    fn handle_help_keys(model: &mut TuiModel) -> Result<TuiMessage> {
        model.mode = ViewMode::ProjectList;
        Ok(TuiMessage::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repodeck_core::app::{ProjectSnapshot, ReconcileState, RegistrySnapshot};
    use repodeck_core::domain::{ChangeStatus, ProjectIdentity};

    fn model_with(ids: &[&str]) -> TuiModel {
        let mut model = TuiModel::new(true);
        model.update_snapshot(RegistrySnapshot {
            projects: ids
                .iter()
                .map(|id| ProjectSnapshot {
                    id: ProjectId::from(*id),
                    identity: ProjectIdentity::default(),
                    change_status: ChangeStatus::Unknown,
                    change_count: None,
                    commits: Default::default(),
                    relations: Default::default(),
                    state: ReconcileState::Ready,
                    last_error: None,
                })
                .collect(),
            ..RegistrySnapshot::default()
        });
        model
    }

    fn press(model: &mut TuiModel, key: KeyCode) -> TuiMessage {
        TuiUpdate::handle_key(model, key, KeyModifiers::NONE).unwrap()
    }

    #[test]
    fn test_refresh_keys_issue_refresh() {
        let mut model = model_with(&["a"]);
        assert_eq!(
            press(&mut model, KeyCode::Char('r')),
            TuiMessage::Command(Command::Refresh)
        );
        assert_eq!(
            press(&mut model, KeyCode::F(5)),
            TuiMessage::Command(Command::Refresh)
        );
    }

    #[test]
    fn test_refresh_is_disabled_while_refreshing() {
        let mut model = model_with(&["a"]);
        model.snapshot.refreshing = true;

        assert_eq!(press(&mut model, KeyCode::Char('r')), TuiMessage::None);
        assert_eq!(model.messages.last().map(String::as_str), Some("Refresh already in progress"));
    }

    #[test]
    fn test_enter_opens_details_of_selected_project() {
        let mut model = model_with(&["a", "b"]);
        press(&mut model, KeyCode::Down);
        press(&mut model, KeyCode::Enter);
        assert_eq!(
            model.mode,
            ViewMode::ProjectDetails {
                id: ProjectId::from("b")
            }
        );

        assert_eq!(
            press(&mut model, KeyCode::Char('u')),
            TuiMessage::Command(Command::RefreshProject {
                id: ProjectId::from("b")
            })
        );

        press(&mut model, KeyCode::Char('b'));
        assert_eq!(model.mode, ViewMode::ProjectList);
    }

    #[test]
    fn test_refresh_selected_project_from_list() {
        let mut model = model_with(&["a"]);
        assert_eq!(
            press(&mut model, KeyCode::Char('u')),
            TuiMessage::Command(Command::RefreshProject {
                id: ProjectId::from("a")
            })
        );

        let mut empty = model_with(&[]);
        assert_eq!(press(&mut empty, KeyCode::Char('u')), TuiMessage::None);
    }

    #[test]
    fn test_quit_keys() {
        let mut model = model_with(&[]);
        assert_eq!(
            press(&mut model, KeyCode::Char('q')),
            TuiMessage::Command(Command::Quit)
        );
        assert_eq!(
            TuiUpdate::handle_key(&mut model, KeyCode::Char('c'), KeyModifiers::CONTROL).unwrap(),
            TuiMessage::Command(Command::Quit)
        );
        assert_eq!(
            press(&mut model, KeyCode::Esc),
            TuiMessage::Command(Command::Quit)
        );
    }

    #[test]
    fn test_escape_dismisses_errors_then_views() {
        let mut model = model_with(&["a"]);
        press(&mut model, KeyCode::Char('?'));
        model.add_error("boom".to_string());

        assert_eq!(press(&mut model, KeyCode::Esc), TuiMessage::None);
        assert!(model.errors.is_empty());
        assert_eq!(model.mode, ViewMode::Help);

        assert_eq!(press(&mut model, KeyCode::Esc), TuiMessage::None);
        assert_eq!(model.mode, ViewMode::ProjectList);
    }
}
