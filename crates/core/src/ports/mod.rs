pub mod discovery;
pub mod hosting;
pub mod inspector;
pub mod persistence;
pub mod time;

// Re-exports
pub use discovery::*;
pub use hosting::*;
pub use inspector::*;
pub use persistence::*;
pub use time::*;
