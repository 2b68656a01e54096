//! # tollgate-test-harness: In-memory host for extension tests
//!
//! Provides a complete, in-process implementation of the host contract from
//! `tollgate-types` so extensions can be tested without a gateway:
//!
//! - [`MemoryConnection`], [`MemoryConnectionGroup`], [`MemoryUser`],
//!   [`MemoryUserGroup`]: plain host entities with builder-style setup
//! - [`MemoryDirectory`]: a keyed store that records every write it receives
//!   and can be told to fail
//! - [`MemoryUserContext`]: a user context assembled through
//!   [`MemoryUserContextBuilder`]
//!
//! ```
//! use tollgate_test_harness::{MemoryConnection, MemoryUserContext};
//! use tollgate_types::{Directory, UserContext};
//!
//! let context = MemoryUserContext::builder("alice")
//!     .with_connection(MemoryConnection::new("1", "build-server"))
//!     .build();
//!
//! let directory = context.connection_directory().unwrap();
//! assert!(directory.get("1").unwrap().is_some());
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

mod context;
mod directory;
mod entities;

pub use context::{MemoryUserContext, MemoryUserContextBuilder};
pub use directory::MemoryDirectory;
pub use entities::{MemoryConnection, MemoryConnectionGroup, MemoryUser, MemoryUserGroup};

/// Identifier of the root connection group in every [`MemoryUserContext`].
pub const ROOT_GROUP_IDENTIFIER: &str = "ROOT";

/// Identifier [`MemoryUserContext`] reports as its authentication provider.
pub const DEFAULT_AUTH_PROVIDER: &str = "memory";

// Lock helpers that recover from poisoning.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
