//! # tollgate-restrict: Login and connection restrictions
//!
//! Adds per-object restrictions (allowed/denied time windows, allowed/denied
//! remote hosts) to connections, connection groups, users and user groups
//! managed by another extension, without that extension knowing about them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Host                                        │
//! │  (asks for directories and schemas)          │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  RestrictUserContext                         │
//! │  ├─ 4 directories → DecoratingDirectory      │
//! │  ├─ 4 schemas     → base ∪ restriction form  │
//! │  └─ everything else forwarded unchanged      │
//! └─────────────────┬───────────────────────────┘
//!                   │  reads: decorate
//!                   │  writes: undecorate
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Wrapped UserContext / Directory             │
//! │  (only ever sees plain host entities)        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Entities read through a decorating directory are wrapped
//! ([`RestrictConnection`], [`RestrictConnectionGroup`], [`RestrictUser`],
//! [`RestrictUserGroup`]). Entities written back are unwrapped to the exact
//! `Arc` that was wrapped. Passing anything else back is rejected with
//! [`DecorationError::TypeMismatch`], surfaced to the host as
//! `GatewayError::BadType`.
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use tollgate_config::TollgateConfig;
//! use tollgate_restrict::RestrictAuthProvider;
//! use tollgate_restrict::attributes::RESTRICT_HOSTS_ALLOWED;
//! use tollgate_test_harness::{MemoryConnection, MemoryUserContext};
//! use tollgate_types::{ClientInfo, Connectable, Tokens, UserContext};
//!
//! let host = MemoryUserContext::builder("alice")
//!     .with_connection(
//!         MemoryConnection::new("1", "office-desktop")
//!             .with_attribute(RESTRICT_HOSTS_ALLOWED, "10.0.0.0/8"),
//!     )
//!     .build();
//!
//! let provider = RestrictAuthProvider::new(&TollgateConfig::default());
//! let context = provider.decorate(Arc::new(host), Some("192.0.2.44".to_string()))?;
//!
//! let connection = context.connection_directory()?.get("1")?.expect("connection exists");
//! let denied = connection.connect(&ClientInfo::default(), &Tokens::new());
//! assert!(denied.is_err());
//! # Ok::<(), tollgate_types::GatewayError>(())
//! ```

pub mod attributes;
pub mod context;
pub mod decorated;
pub mod directory;
pub mod error;
pub mod provider;
pub mod verification;

// Re-export commonly used types
pub use context::RestrictUserContext;
pub use decorated::{
    RestrictConnection, RestrictConnectionGroup, RestrictUser, RestrictUserGroup, Undecorate,
    unwrap_decorated,
};
pub use directory::DecoratingDirectory;
pub use error::{DecorationError, ParseError, RestrictionError};
pub use provider::RestrictAuthProvider;
pub use verification::RestrictionVerifier;
