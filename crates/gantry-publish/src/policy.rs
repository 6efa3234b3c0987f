//! Publish policy and CI detection

use gantry_core::PublishPolicy;
use tracing::debug;

/// CI facts relevant to publishing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    /// Running on a CI server
    pub is_ci: bool,
    /// Tag being built, if any
    pub tag: Option<String>,
}

impl CiEnvironment {
    /// Detect from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Detect from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let is_ci = non_empty("CI").is_some_and(|v| v != "false" && v != "0")
            || non_empty("GITHUB_ACTIONS").is_some()
            || non_empty("GITLAB_CI").is_some()
            || non_empty("TRAVIS").is_some()
            || non_empty("CIRCLECI").is_some()
            || non_empty("BITBUCKET_BUILD_NUMBER").is_some();

        let github_tag = if non_empty("GITHUB_REF_TYPE").as_deref() == Some("tag") {
            non_empty("GITHUB_REF_NAME")
        } else {
            None
        };

        let tag = github_tag
            .or_else(|| non_empty("CI_COMMIT_TAG"))
            .or_else(|| non_empty("TRAVIS_TAG"))
            .or_else(|| non_empty("CIRCLE_TAG"))
            .or_else(|| non_empty("BITBUCKET_TAG"));

        let env = Self { is_ci, tag };
        debug!(is_ci = env.is_ci, tag = ?env.tag, "detected CI environment");
        env
    }

    /// Building a tag on CI
    pub fn is_tagged_build(&self) -> bool {
        self.is_ci && self.tag.is_some()
    }
}

/// Whether uploads run for this invocation
///
/// Without an explicit policy only tagged CI builds publish.
pub fn should_publish(policy: Option<PublishPolicy>, ci: &CiEnvironment) -> bool {
    match policy {
        Some(PublishPolicy::Always) => true,
        Some(PublishPolicy::Never) => false,
        Some(PublishPolicy::OnTag) => ci.tag.is_some(),
        None => ci.is_tagged_build(),
    }
}
