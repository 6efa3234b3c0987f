//! Built-in publishers
//!
//! - **directory**: copies artifacts into a local or mounted directory
//! - **command**: hands each artifact to a user-supplied shell command

pub mod command;
pub mod directory;

pub use command::CommandPublisher;
pub use directory::DirectoryPublisher;
