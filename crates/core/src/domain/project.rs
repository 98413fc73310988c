use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique, stable identifier for a tracked project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn from_path(path: &std::path::Path) -> Self {
        Self(path.to_string_lossy().to_string())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Project metadata (discovered during scanning)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub name: String,
    pub path: PathBuf,
}

impl std::fmt::Display for ProjectMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// Remote and local names of a project, either of which may be unknown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectIdentity {
    pub remote_name: Option<String>,
    pub local_name: Option<String>,
}

/// How a project's identity should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind<'a> {
    /// Neither a remote nor a local name is known
    Unknown,
    /// One name identifies the project (remote preferred)
    Single(&'a str),
    /// Remote and local names differ
    Both { remote: &'a str, local: &'a str },
}

impl ProjectIdentity {
    pub fn new(remote_name: Option<String>, local_name: Option<String>) -> Self {
        Self {
            remote_name,
            local_name,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.remote_name.is_none() && self.local_name.is_none()
    }

    pub fn kind(&self) -> IdentityKind<'_> {
        match (self.remote_name.as_deref(), self.local_name.as_deref()) {
            (None, None) => IdentityKind::Unknown,
            (Some(remote), None) => IdentityKind::Single(remote),
            (None, Some(local)) => IdentityKind::Single(local),
            (Some(remote), Some(local)) if format_name(remote) == format_name(local) => {
                IdentityKind::Single(remote)
            }
            (Some(remote), Some(local)) => IdentityKind::Both { remote, local },
        }
    }
}

/// Display form of a project name: first letter upper-cased, `-` and `_` as spaces
pub fn format_name(name: &str) -> String {
    let spaced = name.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_without_names_is_unknown() {
        let identity = ProjectIdentity::default();
        assert!(identity.is_unknown());
        assert_eq!(identity.kind(), IdentityKind::Unknown);
    }

    #[test]
    fn test_identity_prefers_remote_and_collapses_equal_names() {
        let identity = ProjectIdentity::new(Some("widget".into()), Some("widget".into()));
        assert_eq!(identity.kind(), IdentityKind::Single("widget"));

        let identity = ProjectIdentity::new(Some("widget".into()), None);
        assert_eq!(identity.kind(), IdentityKind::Single("widget"));

        let identity = ProjectIdentity::new(None, Some("widget-local".into()));
        assert_eq!(identity.kind(), IdentityKind::Single("widget-local"));
    }

    #[test]
    fn test_identity_collapses_names_that_display_alike() {
        let identity = ProjectIdentity::new(Some("widget-tool".into()), Some("widget_tool".into()));
        assert_eq!(identity.kind(), IdentityKind::Single("widget-tool"));

        let identity = ProjectIdentity::new(Some("Widget-tool".into()), Some("widget tool".into()));
        assert_eq!(identity.kind(), IdentityKind::Single("Widget-tool"));
    }

    #[test]
    fn test_identity_with_distinct_names() {
        let identity = ProjectIdentity::new(Some("widget".into()), Some("widget-fork".into()));
        assert_eq!(
            identity.kind(),
            IdentityKind::Both {
                remote: "widget",
                local: "widget-fork"
            }
        );
        assert!(!identity.is_unknown());
    }

    #[test]
    fn test_project_id_from_path() {
        let id = ProjectId::from_path(std::path::Path::new("/work/widget"));
        assert_eq!(id.to_string(), "/work/widget");
    }

    #[test]
    fn test_format_name() {
        assert_eq!(format_name("widget-tool"), "Widget tool");
        assert_eq!(format_name("my_cool-app"), "My cool app");
        assert_eq!(format_name("Already"), "Already");
        assert_eq!(format_name("élan"), "Élan");
        assert_eq!(format_name(""), "");
    }
}
