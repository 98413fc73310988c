use crate::domain::ProjectId;
use crate::error::{CoreError, Result};

/// Published project id sequence and the refresh in-flight flag
#[derive(Debug, Clone, Default)]
pub struct ProjectList {
    ids: Vec<ProjectId>,
    refreshing: bool,
    refreshed_at: Option<i64>,
    last_error: Option<String>,
}

impl ProjectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ProjectId] {
        &self.ids
    }

    /// Whether a refresh is in flight; callers should treat refresh as disabled
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn refreshed_at(&self) -> Option<i64> {
        self.refreshed_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Claim the single refresh slot
    pub fn try_begin_refresh(&mut self) -> Result<()> {
        if self.refreshing {
            return Err(CoreError::RefreshInFlight);
        }
        self.refreshing = true;
        Ok(())
    }

    /// Replace the id sequence with a fresh listing
    pub fn finish(&mut self, ids: Vec<ProjectId>, at: i64) {
        self.ids = ids;
        self.refreshing = false;
        self.refreshed_at = Some(at);
        self.last_error = None;
    }

    /// Record a failed refresh, keeping the previous ids
    pub fn fail(&mut self, msg: String) {
        self.refreshing = false;
        self.last_error = Some(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_is_not_reentrant() {
        let mut list = ProjectList::new();
        assert!(list.try_begin_refresh().is_ok());
        assert!(list.is_refreshing());
        assert!(matches!(list.try_begin_refresh(), Err(CoreError::RefreshInFlight)));

        list.finish(vec![ProjectId::from("p1")], 100);
        assert!(!list.is_refreshing());
        assert!(list.try_begin_refresh().is_ok());
    }

    #[test]
    fn test_failed_refresh_keeps_previous_ids() {
        let mut list = ProjectList::new();
        list.try_begin_refresh().unwrap();
        list.finish(vec![ProjectId::from("p1"), ProjectId::from("p2")], 100);

        list.try_begin_refresh().unwrap();
        list.fail("backend offline".to_string());

        assert_eq!(list.ids().len(), 2);
        assert_eq!(list.last_error(), Some("backend offline"));
        assert_eq!(list.refreshed_at(), Some(100));
        assert!(!list.is_refreshing());
    }
}
