use serde::{Deserialize, Serialize};

/// Local-changes indicator derived from a working-tree change count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChangeStatus {
    /// Count not fetched yet
    #[default]
    Unknown,
    Clean,
    Dirty,
}

impl ChangeStatus {
    pub fn from_count(count: Option<usize>) -> Self {
        match count {
            None => ChangeStatus::Unknown,
            Some(0) => ChangeStatus::Clean,
            Some(_) => ChangeStatus::Dirty,
        }
    }
}
