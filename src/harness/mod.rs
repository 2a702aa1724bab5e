//! Test harness.
//!
//! Orchestrates one test run: provision targets, hand the body an explicit
//! [`TestContext`], collect output, and enforce single completion.
//!
//! # Example
//!
//! ```ignore
//! use inspector_harness::{HarnessConfig, TestRunner};
//!
//! let config = HarnessConfig::builder()
//!     .endpoint("ws://127.0.0.1:9222/devtools/browser/6f1c")
//!     .build()?;
//! let runner = TestRunner::connect(config).await?;
//!
//! let report = runner
//!     .run("Tests that navigation completes.", |ctx| async move {
//!         let target = ctx.start_url("https://example.com/", "Tests that navigation completes.").await?;
//!         let title = target.session.evaluate("document.title").await?;
//!         ctx.log(title);
//!         ctx.complete_test()
//!     })
//!     .await?;
//!
//! println!("{}", report.output());
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | [`HarnessConfig`] and its builder |
//! | `targets` | [`TargetProvider`] and the shipped providers |
//! | `completion` | Single-shot completion guard |
//! | `log` | Ordered output and JSON stabilisation |
//! | `runner` | [`TestRunner`], [`TestContext`], [`TestReport`] |

// ============================================================================
// Submodules
// ============================================================================

/// Harness configuration.
pub mod config;

/// Target provisioning.
pub mod targets;

/// Completion guard.
pub mod completion;

/// Run output.
pub mod log;

/// Run lifecycle.
pub mod runner;

// ============================================================================
// Re-exports
// ============================================================================

pub use completion::CompletionState;
pub use config::{HarnessConfig, HarnessConfigBuilder};
pub use log::{format_json, stabilize};
pub use runner::{TestContext, TestReport, TestRunner, TestTarget};
pub use targets::{DevToolsTargets, MemoryTargets, TargetInfo, TargetProvider};
