pub mod classifier;
pub mod commands;
pub mod project_list;
pub mod project_view;
pub mod queries;
pub mod reconciler;

pub use classifier::*;
pub use commands::*;
pub use project_list::*;
pub use project_view::*;
pub use queries::*;
pub use reconciler::*;
