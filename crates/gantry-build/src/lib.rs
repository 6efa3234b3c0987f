//! Gantry Build - artifact building and build-and-publish orchestration
//!
//! The [`Orchestrator`] is the entry point of a build invocation. It takes a
//! loosely typed option map, hands a validated [`BuildRequest`] to an
//! [`ArtifactBuilder`], runs the `afterAllArtifactBuild` hook, and drives
//! uploads through a [`PublishManager`] until they settle.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use gantry_build::{CommandBuilder, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(Arc::new(CommandBuilder::new()));
//! let artifacts = orchestrator.build(&options).await?;
//! ```
//!
//! [`BuildRequest`]: gantry_core::BuildRequest
//! [`PublishManager`]: gantry_publish::PublishManager

pub mod artifacts;
pub mod command;
pub mod factory;
pub mod interrupt;
pub mod orchestration;
pub mod traits;

#[cfg(test)]
mod testing;

pub use artifacts::{artifact_patterns, collect_artifacts, infer_arch, OutputSnapshot};
pub use command::CommandBuilder;
pub use factory::{DefaultPublishManagerFactory, PublishManagerFactory};
pub use interrupt::{CtrlC, InterruptHandler, InterruptSignal, InterruptSource};
pub use orchestration::{Orchestrator, OrchestratorConfig};
pub use traits::ArtifactBuilder;
