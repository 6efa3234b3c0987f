//! Core traits for artifact builders

use async_trait::async_trait;

use gantry_core::{ArtifactListener, BuildRequest, BuildResult, CancellationToken, Result};

/// Produces the artifacts of a build request
///
/// Implementations must honour the token at their suspend points and
/// report every artifact to the listener as soon as it exists.
#[async_trait]
pub trait ArtifactBuilder: Send + Sync {
    /// Build every selected target
    async fn build(
        &self,
        request: &BuildRequest,
        token: &CancellationToken,
        listener: &dyn ArtifactListener,
    ) -> Result<BuildResult>;
}
