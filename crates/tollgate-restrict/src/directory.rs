//! A directory view that decorates entities on the way out and undecorates
//! them on the way in.
//!
//! The underlying host directory only ever sees plain host entities. Callers
//! of the decorating view only ever see decorated ones.

use std::collections::BTreeSet;
use std::sync::Arc;

use tollgate_types::{Directory, GatewayError, GatewayResult};
use tracing::error;

use crate::error::DecorationError;

type DecorateFn<T> = Box<dyn Fn(Arc<T>) -> Arc<T> + Send + Sync>;
type UndecorateFn<T> = Box<dyn Fn(Arc<T>) -> Result<Arc<T>, DecorationError> + Send + Sync>;

/// Wraps a host [`Directory`] with a decorate/undecorate pair.
///
/// `decorate` is applied to every entity read from the underlying
/// directory. `undecorate` is applied to every entity passed to `add` or
/// `update` and must return the exact entity `decorate` was given.
///
/// Holds no state besides the underlying directory and the two functions.
/// Host errors pass through unchanged.
pub struct DecoratingDirectory<T: ?Sized> {
    directory: Arc<dyn Directory<T>>,
    decorate: DecorateFn<T>,
    undecorate: UndecorateFn<T>,
}

impl<T: ?Sized + 'static> DecoratingDirectory<T> {
    pub fn new<D, U>(directory: Arc<dyn Directory<T>>, decorate: D, undecorate: U) -> Self
    where
        D: Fn(Arc<T>) -> Arc<T> + Send + Sync + 'static,
        U: Fn(Arc<T>) -> Result<Arc<T>, DecorationError> + Send + Sync + 'static,
    {
        Self {
            directory,
            decorate: Box::new(decorate),
            undecorate: Box::new(undecorate),
        }
    }

    /// Returns the wrapped host directory.
    pub fn undecorated(&self) -> &Arc<dyn Directory<T>> {
        &self.directory
    }

    fn undecorate(&self, operation: &'static str, object: Arc<T>) -> GatewayResult<Arc<T>> {
        (self.undecorate)(object).map_err(|err| {
            error!(operation, error = %err, "Object was not decorated by this directory");
            GatewayError::from(err)
        })
    }
}

impl<T: ?Sized + 'static> Directory<T> for DecoratingDirectory<T> {
    fn get(&self, identifier: &str) -> GatewayResult<Option<Arc<T>>> {
        Ok(self.directory.get(identifier)?.map(|object| (self.decorate)(object)))
    }

    fn get_all(&self, identifiers: &[String]) -> GatewayResult<Vec<Arc<T>>> {
        Ok(self
            .directory
            .get_all(identifiers)?
            .into_iter()
            .map(|object| (self.decorate)(object))
            .collect())
    }

    fn identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        self.directory.identifiers()
    }

    fn enumerate(&self) -> GatewayResult<Vec<Arc<T>>> {
        Ok(self
            .directory
            .enumerate()?
            .into_iter()
            .map(|object| (self.decorate)(object))
            .collect())
    }

    fn add(&self, object: Arc<T>) -> GatewayResult<()> {
        let object = self.undecorate("add", object)?;
        self.directory.add(object)
    }

    fn update(&self, object: Arc<T>) -> GatewayResult<()> {
        let object = self.undecorate("update", object)?;
        self.directory.update(object)
    }

    fn remove(&self, identifier: &str) -> GatewayResult<()> {
        self.directory.remove(identifier)
    }
}
