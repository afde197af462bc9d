//! Model definitions
//!
//! The typed project model handed over by the descriptor parser.

mod extension;
mod port;
mod project;
mod resource;
mod service;

// Re-exports
pub use extension::*;
pub use port::*;
pub use project::*;
pub use resource::*;
pub use service::*;
