use super::format::{
    change_label, identity_label, refreshed_label, relation_glyph, relation_label, state_label,
};
use super::model::{TuiModel, ViewMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use repodeck_core::app::{ProjectSnapshot, ReconcileState};
use repodeck_core::domain::{ChangeStatus, ProjectId, Relation};

/// The View component of MVU - responsible for rendering the model
pub struct TuiView;

impl TuiView {
    /// Render the entire TUI based on the current model state
    pub fn render(model: &TuiModel, frame: &mut Frame) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(0),    // Main content
                Constraint::Length(2), // Status bar
            ])
            .split(size);

        Self::render_title_bar(model, frame, chunks[0]);

        match &model.mode {
            ViewMode::ProjectList => Self::render_project_list(model, frame, chunks[1]),
            ViewMode::ProjectDetails { id } => {
                Self::render_project_details(model, frame, chunks[1], id)
            }
            ViewMode::Help => Self::render_help_view(frame, chunks[1]),
        }

        Self::render_status_bar(model, frame, chunks[2]);

        if !model.errors.is_empty() {
            Self::render_error_overlay(model, frame, size);
        }
    }

    /// Render the title bar
    fn render_title_bar(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let title = match &model.mode {
            ViewMode::ProjectList => "repodeck - Projects",
            ViewMode::ProjectDetails { .. } => "repodeck - Project Details",
            ViewMode::Help => "repodeck - Help",
        };

        let refreshing_indicator = if model.snapshot.refreshing {
            " [REFRESHING...]"
        } else {
            ""
        };

        let title_paragraph = Paragraph::new(format!("{}{}", title, refreshing_indicator))
            .style(Style::default().fg(Color::White).bg(Color::Blue))
            .alignment(Alignment::Center);

        frame.render_widget(title_paragraph, area);
    }

    /// One card per project: identity, change status, relation glyph per branch
    fn render_project_list(model: &TuiModel, frame: &mut Frame, area: Rect) {
        if model.snapshot.projects.is_empty() {
            let empty_msg = if model.snapshot.refreshing {
                "Looking for projects..."
            } else {
                "No projects found. Press 'r' to refresh."
            };

            let paragraph = Paragraph::new(empty_msg)
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });

            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = model
            .snapshot
            .projects
            .iter()
            .enumerate()
            .map(|(index, project)| {
                let style = if index == model.ui_state.cursor_position {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(Self::project_card(project)).style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Projects ({})", model.snapshot.projects.len())),
        );

        frame.render_widget(list, area);
    }

    fn project_card(project: &ProjectSnapshot) -> Vec<Line<'static>> {
        let mut header = vec![
            Span::styled(
                identity_label(&project.identity),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                change_label(project.change_status, project.change_count),
                Self::change_style(project.change_status),
            ),
        ];
        if project.state != ReconcileState::Ready {
            header.push(Span::styled(
                format!("  [{}]", state_label(project.state)),
                Style::default().fg(Color::Gray),
            ));
        }

        let mut branches = vec![Span::raw("  ")];
        if project.relations.is_empty() {
            branches.push(Span::styled("no branches", Style::default().fg(Color::Gray)));
        }
        for (branch, relation) in &project.relations {
            branches.push(Span::styled(
                relation_glyph(*relation),
                Self::relation_style(*relation),
            ));
            branches.push(Span::raw(format!("{} ", branch)));
        }

        vec![Line::from(header), Line::from(branches)]
    }

    /// Render project details view
    fn render_project_details(model: &TuiModel, frame: &mut Frame, area: Rect, id: &ProjectId) {
        let mut lines = Vec::new();

        if let Some(project) = model.snapshot.project(id) {
            lines.push(Line::from(Span::styled(
                identity_label(&project.identity),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(format!("Path: {}", project.id)));
            lines.push(Line::from(vec![
                Span::raw("Status: "),
                Span::styled(
                    change_label(project.change_status, project.change_count),
                    Self::change_style(project.change_status),
                ),
            ]));
            lines.push(Line::from(format!("Sync: {}", state_label(project.state))));
            if let Some(error) = &project.last_error {
                lines.push(Line::from(Span::styled(
                    format!("Last error: {}", error),
                    Style::default().fg(Color::Red),
                )));
            }
            lines.push(Line::from(""));

            lines.push(Line::from(Span::styled(
                "Branches:",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for (branch, relation) in &project.relations {
                let mut spans = vec![
                    Span::raw("  "),
                    Span::styled(relation_glyph(*relation), Self::relation_style(*relation)),
                    Span::raw(format!(" {:<24}", branch)),
                ];
                if model.ui_state.show_commit_ids {
                    if let Some(commit) = project.commits.get(branch) {
                        spans.push(Span::styled(
                            format!("{} ", commit.short()),
                            Style::default().fg(Color::Yellow),
                        ));
                    }
                }
                spans.push(Span::raw(relation_label(*relation)));
                lines.push(Line::from(spans));
            }
            if project.relations.is_empty() {
                lines.push(Line::from("  (none)"));
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Project Details"))
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, area);
    }

    /// Render help view
    fn render_help_view(frame: &mut Frame, area: Rect) {
        let heading = Style::default().add_modifier(Modifier::UNDERLINED);
        let help_text = vec![
            Line::from(Span::styled(
                "repodeck Help",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled("Navigation:", heading)),
            Line::from("  ↑/k - Move up"),
            Line::from("  ↓/j - Move down"),
            Line::from("  Enter - Project details"),
            Line::from("  b - Back to list"),
            Line::from(""),
            Line::from(Span::styled("Actions:", heading)),
            Line::from("  r / F5 - Refresh project list"),
            Line::from("  u - Refresh selected project"),
            Line::from(""),
            Line::from(Span::styled("Branches:", heading)),
            Line::from("  ↑ ahead   ↓ behind   = in sync   · no reference"),
            Line::from(""),
            Line::from(Span::styled("Global:", heading)),
            Line::from("  ? - Show this help"),
            Line::from("  Ctrl+C / Esc / q - Quit"),
            Line::from(""),
            Line::from("Press any key to close help..."),
        ];

        let help = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: true });

        frame.render_widget(help, area);
    }

    /// Render the status bar at the bottom
    fn render_status_bar(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let status_paragraph = Paragraph::new(Self::build_status_text(model))
            .style(Style::default().fg(Color::White).bg(Color::DarkGray));
        frame.render_widget(status_paragraph, chunks[0]);

        let hints = match &model.mode {
            ViewMode::ProjectList => "? Help | Enter Details | r Refresh | u Refresh project | q Quit",
            ViewMode::ProjectDetails { .. } => "u Refresh project | b Back | q Quit",
            ViewMode::Help => "Any key to close",
        };
        frame.render_widget(
            Paragraph::new(hints).style(Style::default().fg(Color::Gray)),
            chunks[1],
        );
    }

    /// Build status text for the status bar
    fn build_status_text(model: &TuiModel) -> String {
        let projects = &model.snapshot.projects;
        let dirty = projects
            .iter()
            .filter(|p| p.change_status == ChangeStatus::Dirty)
            .count();

        let mut status_parts = vec![
            format!("{} projects", projects.len()),
            format!("{} dirty", dirty),
            refreshed_label(model.snapshot.refreshed_at),
        ];

        if let Some(project) = model.selected_project() {
            status_parts.push(format!("Selected: {}", identity_label(&project.identity)));
        }

        if let Some(message) = model.messages.last() {
            status_parts.push(message.clone());
        }

        status_parts.join(" | ")
    }

    /// Render error overlay
    fn render_error_overlay(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let popup_area = Self::centered_rect(60, 20, area);

        frame.render_widget(Clear, popup_area);

        let error_text: Vec<Line> = model
            .errors
            .iter()
            .map(|error| Line::from(error.as_str()))
            .collect();

        let error_popup = Paragraph::new(error_text)
            .block(Block::default().borders(Borders::ALL).title("Errors (Esc to dismiss)"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });

        frame.render_widget(error_popup, popup_area);
    }

    /// Helper to create centered rectangle
    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }

    fn change_style(status: ChangeStatus) -> Style {
        match status {
            ChangeStatus::Unknown => Style::default().fg(Color::Gray),
            ChangeStatus::Clean => Style::default().fg(Color::Green),
            ChangeStatus::Dirty => Style::default().fg(Color::Red),
        }
    }

    fn relation_style(relation: Relation) -> Style {
        match relation {
            Relation::Ahead => Style::default().fg(Color::Cyan),
            Relation::Behind => Style::default().fg(Color::Magenta),
            Relation::Same => Style::default().fg(Color::Green),
            Relation::Null => Style::default().fg(Color::Gray),
        }
    }
}
