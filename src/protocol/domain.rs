//! Protocol domains.
//!
//! A domain groups related commands and events (`Runtime.evaluate`,
//! `Network.loadingFinished`, ...). Domains are an explicit enum rather than
//! free-form strings so that per-session enable state can be keyed by value.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// Domain
// ============================================================================

/// A named protocol domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    /// Accessibility tree inspection.
    Accessibility,
    /// CSS animations.
    Animation,
    /// Browser-level operations.
    Browser,
    /// Style sheets and computed styles.
    Css,
    /// JavaScript debugger.
    Debugger,
    /// Document object model.
    Dom,
    /// DOM breakpoints.
    DomDebugger,
    /// DOM storage (localStorage / sessionStorage).
    DomStorage,
    /// Device and media emulation.
    Emulation,
    /// Request interception (modern API).
    Fetch,
    /// Stream reading.
    Io,
    /// Input event dispatch.
    Input,
    /// Inspector lifecycle notifications.
    Inspector,
    /// Compositor layers.
    LayerTree,
    /// Browser log entries.
    Log,
    /// Memory instrumentation.
    Memory,
    /// Network activity.
    Network,
    /// Overlay highlighting.
    Overlay,
    /// Page lifecycle and navigation.
    Page,
    /// Performance metrics.
    Performance,
    /// CPU profiler.
    Profiler,
    /// JavaScript runtime.
    Runtime,
    /// Security state.
    Security,
    /// Service workers.
    ServiceWorker,
    /// Storage partitions.
    Storage,
    /// Target discovery and attachment.
    Target,
    /// Trace recording.
    Tracing,
}

/// All known domains, in protocol name order.
pub const ALL_DOMAINS: &[Domain] = &[
    Domain::Accessibility,
    Domain::Animation,
    Domain::Browser,
    Domain::Css,
    Domain::Debugger,
    Domain::Dom,
    Domain::DomDebugger,
    Domain::DomStorage,
    Domain::Emulation,
    Domain::Fetch,
    Domain::Io,
    Domain::Input,
    Domain::Inspector,
    Domain::LayerTree,
    Domain::Log,
    Domain::Memory,
    Domain::Network,
    Domain::Overlay,
    Domain::Page,
    Domain::Performance,
    Domain::Profiler,
    Domain::Runtime,
    Domain::Security,
    Domain::ServiceWorker,
    Domain::Storage,
    Domain::Target,
    Domain::Tracing,
];

impl Domain {
    /// Returns the wire name of the domain.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accessibility => "Accessibility",
            Self::Animation => "Animation",
            Self::Browser => "Browser",
            Self::Css => "CSS",
            Self::Debugger => "Debugger",
            Self::Dom => "DOM",
            Self::DomDebugger => "DOMDebugger",
            Self::DomStorage => "DOMStorage",
            Self::Emulation => "Emulation",
            Self::Fetch => "Fetch",
            Self::Io => "IO",
            Self::Input => "Input",
            Self::Inspector => "Inspector",
            Self::LayerTree => "LayerTree",
            Self::Log => "Log",
            Self::Memory => "Memory",
            Self::Network => "Network",
            Self::Overlay => "Overlay",
            Self::Page => "Page",
            Self::Performance => "Performance",
            Self::Profiler => "Profiler",
            Self::Runtime => "Runtime",
            Self::Security => "Security",
            Self::ServiceWorker => "ServiceWorker",
            Self::Storage => "Storage",
            Self::Target => "Target",
            Self::Tracing => "Tracing",
        }
    }

    /// Builds the fully qualified `Domain.member` name.
    #[inline]
    #[must_use]
    pub fn qualify(self, member: &str) -> String {
        format!("{}.{}", self.as_str(), member)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ALL_DOMAINS
            .iter()
            .copied()
            .find(|domain| domain.as_str() == s)
            .ok_or_else(|| Error::invalid_argument(format!("unknown domain '{s}'")))
    }
}

// ============================================================================
// Method Names
// ============================================================================

/// Splits a `Domain.member` name into its two halves.
///
/// Returns `None` when there is no dot or either half is empty.
#[must_use]
pub fn split_method(method: &str) -> Option<(&str, &str)> {
    let (domain, member) = method.split_once('.')?;
    if domain.is_empty() || member.is_empty() || member.contains('.') {
        return None;
    }
    Some((domain, member))
}

// ============================================================================
// Tests
// ============================================================================
