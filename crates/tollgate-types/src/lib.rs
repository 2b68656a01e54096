//! # tollgate-types: Host contract for `Tollgate`
//!
//! This crate describes the surface a remote-desktop gateway host exposes to
//! its extensions, and which extensions hand back to the host:
//! - Entity capability traits ([`Connection`], [`ConnectionGroup`], [`User`], [`UserGroup`])
//! - Keyed collections of entities ([`Directory`])
//! - The per-session authorization view ([`UserContext`])
//! - Attribute schema descriptors ([`Form`], [`Field`], [`FormSet`])
//! - The host error type ([`GatewayError`])
//!
//! Entities are shared as `Arc<dyn Trait>`. Every entity trait has
//! [`AsAnyArc`] as a supertrait, so an extension can recover the concrete
//! type behind a trait object it produced earlier.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

mod context;
mod directory;
mod entity;
mod form;

pub use context::UserContext;
pub use directory::Directory;
pub use entity::{
    Attributed, Attributes, ClientInfo, Connectable, Connection, ConnectionConfiguration,
    ConnectionGroup, ConnectionGroupType, Identifiable, ObjectKind, ObjectPermission,
    ObjectPermissionType, Permissions, SystemPermission, Tokens, Tunnel, User, UserGroup,
};
pub use form::{Field, FieldType, Form, FormSet};

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by the host or by extensions crossing the host boundary.
///
/// Extensions return these unchanged when they come from the host. An
/// extension's own failures are converted into the closest category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The current user lacks a permission required by the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The operation was refused by a security policy.
    #[error("security policy violation: {0}")]
    Security(String),

    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The object conflicts with existing data (e.g. duplicate identifier).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation is not supported by this implementation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A backing service is unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An object of the wrong concrete type was supplied.
    #[error("bad object type: {0}")]
    BadType(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Server(String),
}

/// Result type for host operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

// ============================================================================
// Dynamic typing
// ============================================================================

/// Upcasts a shared entity to `Any` so it can be downcast to its concrete type.
///
/// Blanket-implemented for every `'static + Send + Sync` type. Because it is
/// a supertrait of each entity trait, the call dispatches through the trait
/// object's vtable and yields the concrete type behind it.
pub trait AsAnyArc: Any + Send + Sync {
    /// Converts `Arc<Self>` into `Arc<dyn Any>` without cloning the value.
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Returns the concrete type name, for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
