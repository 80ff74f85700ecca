pub mod column;
pub mod config;
pub mod project;
pub mod task;

pub use column::*;
pub use config::*;
pub use project::*;
pub use task::*;
