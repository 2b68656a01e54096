//! An in-memory [`Directory`] that records the writes it receives.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tollgate_types::{Directory, GatewayError, GatewayResult, Identifiable};

use crate::{lock, read, write};

/// A keyed store of host entities.
///
/// Objects passed to `add` and `update` are kept by `Arc` so tests can check
/// exactly which allocation reached the store. A failure set with
/// [`fail_with`](Self::fail_with) is returned by every operation until
/// cleared.
pub struct MemoryDirectory<T: ?Sized> {
    objects: RwLock<BTreeMap<String, Arc<T>>>,
    added: Mutex<Vec<Arc<T>>>,
    updated: Mutex<Vec<Arc<T>>>,
    removed: Mutex<Vec<String>>,
    failure: RwLock<Option<GatewayError>>,
    next_id: AtomicU64,
}

impl<T: ?Sized + Identifiable> MemoryDirectory<T> {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            added: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            failure: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Stores `object` directly, without recording it as an `add`.
    pub fn insert(&self, object: Arc<T>) {
        let mut objects = write(&self.objects);
        let identifier = match object.identifier() {
            Some(identifier) => identifier,
            None => self.assign_identifier(&objects, &object),
        };
        objects.insert(identifier, object);
    }

    pub fn fail_with(&self, error: GatewayError) {
        *write(&self.failure) = Some(error);
    }

    pub fn clear_failure(&self) {
        *write(&self.failure) = None;
    }

    /// Returns the stored object without going through `get`.
    pub fn stored(&self, identifier: &str) -> Option<Arc<T>> {
        read(&self.objects).get(identifier).cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.objects).is_empty()
    }

    /// Every object received by `add`, in call order.
    pub fn added(&self) -> Vec<Arc<T>> {
        lock(&self.added).clone()
    }

    /// Every object received by `update`, in call order.
    pub fn updated(&self) -> Vec<Arc<T>> {
        lock(&self.updated).clone()
    }

    /// Every identifier received by `remove`, in call order.
    pub fn removed(&self) -> Vec<String> {
        lock(&self.removed).clone()
    }

    fn check(&self) -> GatewayResult<()> {
        match read(&self.failure).as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn assign_identifier(&self, objects: &BTreeMap<String, Arc<T>>, object: &Arc<T>) -> String {
        let identifier = loop {
            let candidate = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
            if !objects.contains_key(&candidate) {
                break candidate;
            }
        };
        object.set_identifier(Some(identifier.clone()));
        identifier
    }
}

impl<T: ?Sized + Identifiable> Default for MemoryDirectory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Identifiable> Directory<T> for MemoryDirectory<T> {
    fn get(&self, identifier: &str) -> GatewayResult<Option<Arc<T>>> {
        self.check()?;
        Ok(self.stored(identifier))
    }

    fn get_all(&self, identifiers: &[String]) -> GatewayResult<Vec<Arc<T>>> {
        self.check()?;
        let objects = read(&self.objects);
        Ok(identifiers
            .iter()
            .filter_map(|identifier| objects.get(identifier).cloned())
            .collect())
    }

    fn identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        self.check()?;
        Ok(read(&self.objects).keys().cloned().collect())
    }

    fn add(&self, object: Arc<T>) -> GatewayResult<()> {
        self.check()?;
        let mut objects = write(&self.objects);

        let identifier = match object.identifier() {
            Some(identifier) if objects.contains_key(&identifier) => {
                return Err(GatewayError::Conflict(format!(
                    "object {identifier} already exists"
                )));
            }
            Some(identifier) => identifier,
            None => self.assign_identifier(&objects, &object),
        };

        objects.insert(identifier, Arc::clone(&object));
        lock(&self.added).push(object);
        Ok(())
    }

    fn update(&self, object: Arc<T>) -> GatewayResult<()> {
        self.check()?;
        let mut objects = write(&self.objects);

        let identifier = object
            .identifier()
            .filter(|identifier| objects.contains_key(identifier))
            .ok_or_else(|| GatewayError::NotFound("object has not been added".to_string()))?;

        objects.insert(identifier, Arc::clone(&object));
        lock(&self.updated).push(object);
        Ok(())
    }

    fn remove(&self, identifier: &str) -> GatewayResult<()> {
        self.check()?;
        if write(&self.objects).remove(identifier).is_none() {
            return Err(GatewayError::NotFound(format!("object {identifier}")));
        }
        lock(&self.removed).push(identifier.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryUser;
    use tollgate_types::User;

    fn users() -> MemoryDirectory<dyn User> {
        let directory = MemoryDirectory::<dyn User>::new();
        directory.insert(Arc::new(MemoryUser::new("alice")));
        directory.insert(Arc::new(MemoryUser::new("bob")));
        directory
    }

    #[test]
    fn get_all_skips_unknown_identifiers() {
        let directory = users();
        let found = directory
            .get_all(&["bob".to_string(), "mallory".to_string()])
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].identifier().as_deref(), Some("bob"));
    }

    #[test]
    fn add_assigns_identifiers_and_rejects_duplicates() {
        let directory = users();

        let user: Arc<dyn User> = Arc::new(MemoryUser::new("x"));
        user.set_identifier(None);
        directory.add(Arc::clone(&user)).unwrap();
        assert_eq!(user.identifier().as_deref(), Some("1"));

        let duplicate = directory.add(Arc::new(MemoryUser::new("alice")));
        assert!(matches!(duplicate, Err(GatewayError::Conflict(_))));
        assert_eq!(directory.added().len(), 1);
        assert!(Arc::ptr_eq(&directory.added()[0], &user));
    }

    #[test]
    fn update_and_remove_require_existing_objects() {
        let directory = users();

        let result = directory.update(Arc::new(MemoryUser::new("carol")));
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
        assert!(matches!(directory.remove("carol"), Err(GatewayError::NotFound(_))));

        directory.remove("bob").unwrap();
        assert_eq!(directory.removed(), vec!["bob".to_string()]);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn injected_failures_are_returned_until_cleared() {
        let directory = users();
        directory.fail_with(GatewayError::Unavailable("ldap down".to_string()));

        assert_eq!(
            directory.identifiers().unwrap_err(),
            GatewayError::Unavailable("ldap down".to_string())
        );

        directory.clear_failure();
        assert_eq!(directory.identifiers().unwrap().len(), 2);
    }
}
