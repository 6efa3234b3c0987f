//! CLI commands

mod build;
mod validate;

pub use build::BuildCommand;
pub use validate::ValidateCommand;
