//! High-level page session.
//!
//! [`PageSession`] builds compound operations from domain primitives:
//!
//! | Method | Sequence |
//! |--------|----------|
//! | `navigate` | `Page.enable`, wait for `Page.loadEventFired`, `Page.navigate` |
//! | `reload` | `Page.enable`, wait for `Page.loadEventFired`, `Page.reload` |
//! | `evaluate` | `Runtime.evaluate` by value |
//! | `evaluate_async` | `Runtime.evaluate` awaiting the promise, then `Runtime.awaitPromise` if still pending |
//! | `load_html` | `document.write` through `Runtime.evaluate` |

// ============================================================================
// Submodules
// ============================================================================

mod core;
mod navigation;
mod script;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::PageSession;
