//! Keyed collections of entities.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::GatewayResult;

/// A keyed, enumerable collection of entities of one kind.
///
/// `T` is normally an entity trait object such as `dyn Connection`. The
/// host's implementation is the source of truth. Extensions may wrap it, but
/// every wrapper must eventually hand plain host entities back to it.
pub trait Directory<T: ?Sized>: Send + Sync {
    /// Returns the object with the given identifier, or `None` if absent or
    /// not visible to the current user.
    fn get(&self, identifier: &str) -> GatewayResult<Option<Arc<T>>>;

    /// Returns all objects with the given identifiers. Unknown identifiers
    /// are silently skipped.
    fn get_all(&self, identifiers: &[String]) -> GatewayResult<Vec<Arc<T>>>;

    /// Returns the identifiers of every object visible to the current user.
    fn identifiers(&self) -> GatewayResult<BTreeSet<String>>;

    /// Adds a new object. The store may assign its identifier.
    fn add(&self, object: Arc<T>) -> GatewayResult<()>;

    /// Persists changes made to an existing object.
    fn update(&self, object: Arc<T>) -> GatewayResult<()>;

    /// Removes the object with the given identifier.
    fn remove(&self, identifier: &str) -> GatewayResult<()>;

    /// Returns every object visible to the current user.
    fn enumerate(&self) -> GatewayResult<Vec<Arc<T>>> {
        let identifiers: Vec<String> = self.identifiers()?.into_iter().collect();
        self.get_all(&identifiers)
    }
}
