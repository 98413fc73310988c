pub mod discovery;
pub mod git;
pub mod github;
pub mod persistence;

pub use discovery::FsDiscoveryAdapter;
pub use git::GitInspector;
pub use github::GithubCatalog;
pub use persistence::FileConfigStore;
