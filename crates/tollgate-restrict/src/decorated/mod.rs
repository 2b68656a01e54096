//! Restriction-aware wrappers around host entities.
//!
//! Each wrapper holds exactly one host entity, implements the same host
//! trait by forwarding, and can hand the original `Arc` back through
//! [`Undecorate`]. The only behavior that differs from the wrapped entity is
//! restriction handling: attribute normalisation on every kind and
//! restriction checks on connect for connections and connection groups.

mod connection;
mod connection_group;
mod user;
mod user_group;

use std::any::type_name;
use std::sync::Arc;

use tollgate_types::AsAnyArc;

use crate::error::DecorationError;

pub use connection::RestrictConnection;
pub use connection_group::RestrictConnectionGroup;
pub use user::RestrictUser;
pub use user_group::RestrictUserGroup;

/// A wrapper that can return the entity it decorates.
pub trait Undecorate {
    /// The host entity type being wrapped, e.g. `dyn Connection`.
    type Undecorated: ?Sized + AsAnyArc;

    /// Returns the wrapped entity: the same allocation that was decorated.
    fn undecorated(&self) -> Arc<Self::Undecorated>;
}

/// Recovers the host entity from an object expected to be a `W` wrapper.
///
/// Fails with [`DecorationError::TypeMismatch`] when `object` is anything
/// other than a `W`, such as a plain host entity or another extension's
/// wrapper.
pub fn unwrap_decorated<W>(
    object: Arc<W::Undecorated>,
) -> Result<Arc<W::Undecorated>, DecorationError>
where
    W: Undecorate + AsAnyArc,
{
    let found = <W::Undecorated as AsAnyArc>::type_name(&*object);

    <W::Undecorated as AsAnyArc>::as_any_arc(object)
        .downcast::<W>()
        .map(|wrapper| wrapper.undecorated())
        .map_err(|_| DecorationError::TypeMismatch {
            expected: short_type_name(type_name::<W>()),
            found: short_type_name(found),
        })
}

/// Strips the module path, leaving generic arguments alone.
fn short_type_name(name: &'static str) -> &'static str {
    let end = name.find('<').unwrap_or(name.len());
    match name[..end].rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

/// Describes an entity in logs and errors, e.g. `connection 12`.
fn describe(kind: &str, identifier: Option<String>) -> String {
    match identifier {
        Some(identifier) => format!("{kind} {identifier}"),
        None => format!("unsaved {kind}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_type_name_drops_path() {
        assert_eq!(
            short_type_name("tollgate_restrict::decorated::RestrictUser"),
            "RestrictUser"
        );
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(
            short_type_name("alloc::sync::Arc<dyn tollgate_types::User>"),
            "Arc<dyn tollgate_types::User>"
        );
    }

    #[test]
    fn describe_handles_unsaved_entities() {
        assert_eq!(describe("connection", Some("12".into())), "connection 12");
        assert_eq!(describe("user", None), "unsaved user");
    }
}
