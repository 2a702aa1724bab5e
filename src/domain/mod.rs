//! Domain proxy.
//!
//! A [`DomainProxy`] turns `Domain.method` calls into session commands and
//! `Domain.event` registrations into subscriptions. Domains are an explicit
//! enum and members are checked against a static schema table, so typos are
//! caught locally under [`SchemaPolicy::Strict`](crate::protocol::SchemaPolicy).
//!
//! # Access Styles
//!
//! ```ignore
//! // Untyped
//! dp.domain(Domain::Css).invoke("getComputedStyleForNode", json!({ "nodeId": 4 })).await?;
//! dp.domain(Domain::Log).on("entryAdded", |event| println!("{}", event.params))?;
//!
//! // Typed
//! let result = dp.runtime().evaluate(EvaluateParams::by_value("1+1")).await?;
//! dp.network().once_loading_finished()?.await?;
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `proxy` | [`DomainProxy`], [`DomainHandle`] |
//! | `runtime` | Typed `Runtime` commands |
//! | `page` | Typed `Page` commands |
//! | `network` | Typed `Network` commands |
//! | `target` | Typed `Target` commands |

// ============================================================================
// Submodules
// ============================================================================

/// Proxy and untyped handle.
pub mod proxy;

/// `Network` domain.
pub mod network;

/// `Page` domain.
pub mod page;

/// `Runtime` domain.
pub mod runtime;

/// `Target` domain.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use network::NetworkDomain;
pub use page::PageDomain;
pub use proxy::{DomainHandle, DomainProxy};
pub use runtime::RuntimeDomain;
pub use target::TargetDomain;
