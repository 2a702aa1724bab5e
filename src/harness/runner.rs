//! Test run lifecycle.
//!
//! [`TestRunner::run`] drives one test body:
//!
//! 1. A [`TestContext`] is created and handed to the body.
//! 2. The body provisions targets (`start_blank` / `start_html` / `start_url`),
//!    talks to them and logs output.
//! 3. The run ends when `complete_test` is called. If the body returns and
//!    every context clone is gone without completion, the run is incomplete.
//! 4. Teardown collects violations, closes sessions and targets, and returns
//!    a [`TestReport`]. [`TestRunner::run`] fails the run on any violation;
//!    [`TestRunner::run_report`] hands them back in the report.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::DomainProxy;
use crate::error::{Error, Result};
use crate::identifiers::RunId;
use crate::interception::InterceptionController;
use crate::page::PageSession;
use crate::session::ProtocolSession;

use super::completion::{CompletionGuard, CompletionState};
use super::config::HarnessConfig;
use super::log::{OutputLog, format_json};
use super::targets::{DevToolsTargets, TargetInfo, TargetProvider};

// ============================================================================
// Constants
// ============================================================================

/// URL of a blank page.
const BLANK_URL: &str = "about:blank";

// ============================================================================
// TestTarget
// ============================================================================

/// A provisioned page with its protocol handles.
#[derive(Debug, Clone)]
pub struct TestTarget {
    /// The page target.
    pub target: TargetInfo,
    /// High-level page operations.
    pub session: PageSession,
    /// Domain proxy over the page's protocol session.
    pub dp: DomainProxy,
    /// Request interception for the page.
    pub interception: InterceptionController,
}

impl TestTarget {
    /// Returns the raw protocol session.
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> &ProtocolSession {
        self.dp.session()
    }
}

// ============================================================================
// TestReport
// ============================================================================

/// Outcome of a completed run.
#[derive(Debug, Clone)]
#[must_use = "a report may carry violations; check `is_clean` or call `into_result`"]
pub struct TestReport {
    /// Run id.
    pub id: RunId,
    /// Run description.
    pub description: String,
    /// Ordered output.
    pub log: Vec<String>,
    /// Protocol violations and harness misuse observed during the run.
    pub violations: Vec<String>,
}

impl TestReport {
    /// Returns `true` if no violation was recorded.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns the output joined by newlines.
    #[must_use]
    pub fn output(&self) -> String {
        self.log.join("\n")
    }

    /// Converts the report into its output, failing on any violation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] listing every violation.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.violations.is_empty() {
            Ok(self.log)
        } else {
            Err(Error::protocol_violation(self.violations.join("; ")))
        }
    }
}

// ============================================================================
// RunShared
// ============================================================================

/// State of one run, shared by the runner and every context clone.
struct RunShared {
    id: RunId,
    description: String,
    config: HarnessConfig,
    provider: Arc<dyn TargetProvider>,
    log: Mutex<OutputLog>,
    completion: CompletionGuard,
    targets: Mutex<Vec<TestTarget>>,
}

// ============================================================================
// TestContext
// ============================================================================

/// Handle passed to a test body.
///
/// Clones share the run. Keep a clone inside event handlers that complete
/// the test asynchronously; a run is incomplete only once every clone has
/// been dropped without [`complete_test`](Self::complete_test).
#[derive(Clone)]
pub struct TestContext {
    run: Arc<RunShared>,
    done: mpsc::UnboundedSender<()>,
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("id", &self.run.id)
            .field("description", &self.run.description)
            .field("state", &self.run.completion.state())
            .finish()
    }
}

impl TestContext {
    /// Returns the run id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RunId {
        self.run.id
    }

    /// Returns the run description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.run.description
    }

    /// Returns `true` once the run has completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.run.completion.state() == CompletionState::Completed
    }

    // ========================================================================
    // Targets
    // ========================================================================

    /// Opens a blank page.
    ///
    /// # Errors
    ///
    /// Provider or session errors.
    pub async fn start_blank(&self, description: &str) -> Result<TestTarget> {
        self.log(description);
        self.open(BLANK_URL).await
    }

    /// Opens a page showing literal markup.
    ///
    /// # Errors
    ///
    /// Provider or session errors, or an evaluation error while writing the
    /// document.
    pub async fn start_html(&self, markup: &str, description: &str) -> Result<TestTarget> {
        self.log(description);
        let target = self.open(BLANK_URL).await?;
        target.session.load_html(markup).await?;
        Ok(target)
    }

    /// Opens a page and navigates it to `url`.
    ///
    /// # Errors
    ///
    /// Provider or session errors, or [`Error::Navigation`].
    pub async fn start_url(&self, url: &str, description: &str) -> Result<TestTarget> {
        self.log(description);
        let target = self.open(BLANK_URL).await?;
        target.session.navigate(url).await?;
        Ok(target)
    }

    async fn open(&self, url: &str) -> Result<TestTarget> {
        let (info, channel) = self.run.provider.open_target(url).await?;
        debug!(run_id = %self.run.id, target_id = %info.id, %url, "Target provisioned");

        let dp = DomainProxy::with_policy(ProtocolSession::new(channel), self.run.config.schema_policy());
        let target = TestTarget {
            session: PageSession::for_target(info.id.clone(), dp.clone()),
            interception: InterceptionController::new(dp.clone()),
            target: info,
            dp,
        };

        self.run.targets.lock().push(target.clone());
        Ok(target)
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Appends a line to the run output.
    pub fn log(&self, value: impl fmt::Display) {
        self.run.log.lock().push(value.to_string());
    }

    /// Appends a titled JSON value with sorted keys.
    ///
    /// Volatile fields are replaced with placeholders unless disabled in the
    /// configuration.
    pub fn log_json(&self, title: &str, value: &Value) {
        let text = format_json(title, value, self.run.config.stabilize_names());
        self.run.log.lock().push(text);
    }

    /// Returns the output so far.
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        self.run.log.lock().lines().to_vec()
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Marks the run completed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] if the run was already completed;
    /// the misuse is also reported in the [`TestReport`].
    pub fn complete_test(&self) -> Result<()> {
        self.run.completion.complete(&self.done)?;
        info!(run_id = %self.run.id, "Test completed");
        Ok(())
    }
}

// ============================================================================
// TestRunner
// ============================================================================

/// Runs test bodies against targets from a [`TargetProvider`].
///
/// The runner never retries a failed run.
pub struct TestRunner {
    config: HarnessConfig,
    provider: Arc<dyn TargetProvider>,
}

impl fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TestRunner {
    /// Creates a runner over a target provider.
    #[must_use]
    pub fn with_provider(config: HarnessConfig, provider: Arc<dyn TargetProvider>) -> Self {
        Self { config, provider }
    }

    /// Connects to the browser endpoint in `config`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no endpoint is configured
    /// - [`Error::Connection`] if the handshake fails
    pub async fn connect(config: HarnessConfig) -> Result<Self> {
        let endpoint = config
            .endpoint()
            .cloned()
            .ok_or_else(|| Error::config("an endpoint is required to connect to a browser"))?;

        let provider = DevToolsTargets::connect(&endpoint).await?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs one test body.
    ///
    /// # Errors
    ///
    /// - The body's own error
    /// - [`Error::IncompleteRun`] if completion was never signalled
    /// - [`Error::Timeout`] if the configured run timeout elapsed
    /// - [`Error::ProtocolViolation`] listing every violation recorded during
    ///   the run
    ///
    /// Teardown runs in every case. Use [`run_report`](Self::run_report) to
    /// inspect the output of a run that recorded violations.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let report = runner
    ///     .run("Tests that 1+1 is 2.", |ctx| async move {
    ///         let target = ctx.start_blank("Tests that 1+1 is 2.").await?;
    ///         let two = target.session.evaluate("1+1").await?;
    ///         ctx.log(format!("result: {two}"));
    ///         ctx.complete_test()
    ///     })
    ///     .await?;
    /// ```
    pub async fn run<F, Fut>(&self, description: &str, body: F) -> Result<TestReport>
    where
        F: FnOnce(TestContext) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let report = self.run_report(description, body).await?;
        if report.is_clean() {
            Ok(report)
        } else {
            Err(Error::protocol_violation(report.violations.join("; ")))
        }
    }

    /// Runs one test body and returns its report even when violations were
    /// recorded.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), except that violations are left in
    /// [`TestReport::violations`].
    pub async fn run_report<F, Fut>(&self, description: &str, body: F) -> Result<TestReport>
    where
        F: FnOnce(TestContext) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let run = Arc::new(RunShared {
            id: RunId::generate(),
            description: description.to_string(),
            config: self.config.clone(),
            provider: Arc::clone(&self.provider),
            log: Mutex::new(OutputLog::default()),
            completion: CompletionGuard::new(),
            targets: Mutex::new(Vec::new()),
        });

        info!(run_id = %run.id, description, "Test run started");

        let context = TestContext {
            run: Arc::clone(&run),
            done: done_tx,
        };

        let incomplete = Error::incomplete_run(description);
        let drive = async move {
            body(context).await?;
            match done_rx.recv().await {
                Some(()) => Ok(()),
                None => Err(incomplete),
            }
        };

        let outcome = match self.config.run_timeout() {
            Some(limit) => match timeout(limit, drive).await {
                Ok(result) => result,
                Err(_) => Err(Error::timeout(
                    format!("test run '{description}'"),
                    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                )),
            },
            None => drive.await,
        };

        let violations = self.teardown(&run).await;

        if let Err(e) = outcome {
            warn!(run_id = %run.id, error = %e, "Test run failed");
            return Err(e);
        }

        let log = run.log.lock().take();
        info!(run_id = %run.id, violations = violations.len(), "Test run finished");

        Ok(TestReport {
            id: run.id,
            description: run.description.clone(),
            log,
            violations,
        })
    }

    /// Collects violations, then closes every session and target of a run.
    async fn teardown(&self, run: &RunShared) -> Vec<String> {
        let targets = std::mem::take(&mut *run.targets.lock());
        let mut violations = run.completion.take_misuse();

        for target in &targets {
            for request in target.interception.unresolved() {
                violations.push(format!(
                    "interception {} for {} was never resolved",
                    request.interception_id, request.url
                ));
            }
            violations.extend(target.interception.violations());
            violations.extend(target.protocol().take_violations());

            target.protocol().close().await;

            if self.config.close_targets()
                && let Err(e) = self.provider.close_target(&target.target).await
            {
                warn!(target_id = %target.target.id, error = %e, "Failed to close target");
            }
        }

        for violation in &violations {
            warn!(run_id = %run.id, %violation, "Run violation");
        }

        violations
    }
}
