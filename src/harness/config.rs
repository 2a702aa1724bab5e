//! Harness configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use inspector_harness::HarnessConfig;
//!
//! let config = HarnessConfig::builder()
//!     .endpoint("ws://127.0.0.1:9222/devtools/browser/6f1c")
//!     .run_timeout(Duration::from_secs(30))
//!     .strict_schema()
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::protocol::SchemaPolicy;

// ============================================================================
// HarnessConfig
// ============================================================================

/// Validated harness configuration.
///
/// Use [`HarnessConfig::builder()`] to create one; [`Default`] gives a
/// configuration without an endpoint, suitable for custom target providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    endpoint: Option<Url>,
    run_timeout: Option<Duration>,
    schema_policy: SchemaPolicy,
    stabilize_names: bool,
    close_targets: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            run_timeout: None,
            schema_policy: SchemaPolicy::Permissive,
            stabilize_names: true,
            close_targets: true,
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::new()
    }

    /// Browser-level DevTools endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    /// Limit on a whole test run. `None` means no limit.
    #[inline]
    #[must_use]
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout
    }

    /// Schema policy for every domain proxy the harness creates.
    #[inline]
    #[must_use]
    pub fn schema_policy(&self) -> SchemaPolicy {
        self.schema_policy
    }

    /// Whether `log_json` replaces volatile fields with placeholders.
    #[inline]
    #[must_use]
    pub fn stabilize_names(&self) -> bool {
        self.stabilize_names
    }

    /// Whether targets are closed when a run ends.
    #[inline]
    #[must_use]
    pub fn close_targets(&self) -> bool {
        self.close_targets
    }
}

// ============================================================================
// HarnessConfigBuilder
// ============================================================================

/// Builder for [`HarnessConfig`].
#[derive(Debug, Clone)]
pub struct HarnessConfigBuilder {
    /// Unparsed endpoint URL.
    endpoint: Option<String>,
    /// Whole-run timeout.
    run_timeout: Option<Duration>,
    /// Schema policy.
    schema_policy: SchemaPolicy,
    /// Placeholder substitution in `log_json`.
    stabilize_names: bool,
    /// Target cleanup.
    close_targets: bool,
}

impl Default for HarnessConfigBuilder {
    fn default() -> Self {
        let defaults = HarnessConfig::default();
        Self {
            endpoint: None,
            run_timeout: defaults.run_timeout,
            schema_policy: defaults.schema_policy,
            stabilize_names: defaults.stabilize_names,
            close_targets: defaults.close_targets,
        }
    }
}

impl HarnessConfigBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the browser-level DevTools endpoint (`ws://` or `wss://`).
    ///
    /// # Arguments
    ///
    /// * `url` - e.g. `ws://127.0.0.1:9222/devtools/browser/<id>`
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Fails a run that has not completed within `limit`.
    #[inline]
    #[must_use]
    pub fn run_timeout(mut self, limit: Duration) -> Self {
        self.run_timeout = Some(limit);
        self
    }

    /// Sets the schema policy.
    #[inline]
    #[must_use]
    pub fn schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.schema_policy = policy;
        self
    }

    /// Shorthand for [`SchemaPolicy::Strict`].
    #[inline]
    #[must_use]
    pub fn strict_schema(self) -> Self {
        self.schema_policy(SchemaPolicy::Strict)
    }

    /// Enables or disables placeholder substitution in `log_json`.
    #[inline]
    #[must_use]
    pub fn stabilize_names(mut self, enabled: bool) -> Self {
        self.stabilize_names = enabled;
        self
    }

    /// Keeps or closes targets at the end of a run.
    #[inline]
    #[must_use]
    pub fn close_targets(mut self, enabled: bool) -> Self {
        self.close_targets = enabled;
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the endpoint is not a valid `ws`/`wss` URL
    /// - [`Error::Config`] if the run timeout is zero
    pub fn build(self) -> Result<HarnessConfig> {
        let endpoint = self.validate_endpoint()?;

        if self.run_timeout == Some(Duration::ZERO) {
            return Err(Error::config("run timeout must be greater than zero"));
        }

        Ok(HarnessConfig {
            endpoint,
            run_timeout: self.run_timeout,
            schema_policy: self.schema_policy,
            stabilize_names: self.stabilize_names,
            close_targets: self.close_targets,
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

impl HarnessConfigBuilder {
    /// Parses and checks the endpoint URL.
    fn validate_endpoint(&self) -> Result<Option<Url>> {
        let Some(raw) = self.endpoint.as_deref() else {
            return Ok(None);
        };

        let url = Url::parse(raw)
            .map_err(|e| Error::config(format!("invalid endpoint '{raw}': {e}")))?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::config(format!(
                    "endpoint scheme must be ws or wss, got '{other}'\n\
                     Example: ws://127.0.0.1:9222/devtools/browser/<id>"
                )));
            }
        }

        if url.host_str().is_none() {
            return Err(Error::config(format!("endpoint '{raw}' has no host")));
        }

        Ok(Some(url))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::builder().build().expect("config");
        assert!(config.endpoint().is_none());
        assert!(config.run_timeout().is_none());
        assert_eq!(config.schema_policy(), SchemaPolicy::Permissive);
        assert!(config.stabilize_names());
        assert!(config.close_targets());
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn test_full_configuration() {
        let config = HarnessConfig::builder()
            .endpoint("ws://127.0.0.1:9222/devtools/browser/abc")
            .run_timeout(Duration::from_secs(5))
            .strict_schema()
            .stabilize_names(false)
            .close_targets(false)
            .build()
            .expect("config");

        let endpoint = config.endpoint().expect("endpoint");
        assert_eq!(endpoint.port(), Some(9222));
        assert_eq!(config.run_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.schema_policy(), SchemaPolicy::Strict);
        assert!(!config.stabilize_names());
        assert!(!config.close_targets());
    }

    #[test]
    fn test_rejects_http_endpoint() {
        let err = HarnessConfig::builder()
            .endpoint("http://127.0.0.1:9222/json")
            .build()
            .expect_err("http scheme");
        assert!(err.to_string().contains("ws or wss"));
    }

    #[test]
    fn test_rejects_unparseable_endpoint() {
        let err = HarnessConfig::builder()
            .endpoint("not a url")
            .build()
            .expect_err("garbage");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = HarnessConfig::builder()
            .run_timeout(Duration::ZERO)
            .build()
            .expect_err("zero timeout");
        assert!(err.to_string().contains("timeout"));
    }
}
