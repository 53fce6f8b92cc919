pub mod config;
pub mod edit;
pub mod path;
pub mod status;
pub mod task;

pub use config::*;
pub use edit::*;
pub use path::*;
pub use status::*;
pub use task::*;
