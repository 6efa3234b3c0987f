//! Configuration system for Gantry

pub mod defaults;
mod loader;
pub mod options;
mod types;
pub mod validation;

pub use defaults::*;
pub use loader::*;
pub use options::{check_build_request_options, BuildOptions, BuildRequest, ConfigSource};
pub use types::*;
pub use validation::*;
