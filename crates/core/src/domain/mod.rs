pub mod branch;
pub mod events;
pub mod project;
pub mod status;

// Re-exports for convenience
pub use branch::*;
pub use events::*;
pub use project::*;
pub use status::*;
