use crate::domain::project::ProjectId;

/// Commands that can be sent to the application service
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Resynchronize the project set and republish the id list
    Refresh,

    /// Reload one project and start a new reconciliation cycle for it
    RefreshProject { id: ProjectId },

    /// Re-fetch commit maps and change counts of settled projects
    Poll,

    /// Quit the application
    Quit,
}
