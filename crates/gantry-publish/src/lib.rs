//! Upload scheduling and publishers for Gantry
//!
//! This crate owns everything that happens to an artifact after it has been
//! built: deciding whether to publish, scheduling uploads, and the publishers
//! that carry them out.
//!
//! ## Built-in Publishers
//!
//! - **directory**: copies artifacts into `<path>/<version>/`
//! - **command**: runs a shell command per artifact
//!
//! ## Usage
//!
//! ```ignore
//! use gantry_publish::{PublishManager, PublisherRegistry, SchedulerOptions, UploadScheduler};
//!
//! let scheduler = UploadScheduler::new(
//!     Arc::new(PublisherRegistry::with_builtins()),
//!     &token,
//!     SchedulerOptions { concurrency: 4, publish: true },
//! );
//! scheduler.schedule_upload(&config, UploadTask::new("dist/app.dmg", None), &app)?;
//! scheduler.await_tasks().await?;
//! ```

pub mod manager;
pub mod policy;
pub mod providers;
pub mod registry;
pub mod scheduler;
pub mod traits;
pub mod types;

pub use manager::PublishManager;
pub use policy::{should_publish, CiEnvironment};
pub use providers::{CommandPublisher, DirectoryPublisher};
pub use registry::PublisherRegistry;
pub use scheduler::{SchedulerOptions, UploadScheduler, DEFAULT_UPLOAD_CONCURRENCY};
pub use traits::Publisher;
pub use types::*;
