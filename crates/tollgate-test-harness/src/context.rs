//! An in-memory [`UserContext`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tollgate_types::{
    Connection, ConnectionGroup, Directory, Form, FormSet, GatewayError, GatewayResult,
    Identifiable, User, UserContext, UserGroup,
};

use crate::{
    DEFAULT_AUTH_PROVIDER, MemoryConnection, MemoryConnectionGroup, MemoryDirectory, MemoryUser,
    MemoryUserGroup, ROOT_GROUP_IDENTIFIER,
};

/// A user context backed by four [`MemoryDirectory`] instances.
///
/// The directories are shared with the context, so anything a test does
/// through [`users`](Self::users) and friends is visible through the
/// [`UserContext`] accessors and vice versa.
pub struct MemoryUserContext {
    self_user: Arc<dyn User>,
    auth_provider: String,
    users: Arc<MemoryDirectory<dyn User>>,
    user_groups: Arc<MemoryDirectory<dyn UserGroup>>,
    connections: Arc<MemoryDirectory<dyn Connection>>,
    connection_groups: Arc<MemoryDirectory<dyn ConnectionGroup>>,
    root: Arc<dyn ConnectionGroup>,
    active_connections: BTreeSet<String>,
    user_forms: FormSet,
    user_group_forms: FormSet,
    connection_forms: FormSet,
    connection_group_forms: FormSet,
    sharing_profile_forms: FormSet,
    unavailable: Option<GatewayError>,
    invalidated: AtomicBool,
}

impl MemoryUserContext {
    /// Starts building a context for the user named `username`.
    pub fn builder(username: impl Into<String>) -> MemoryUserContextBuilder {
        MemoryUserContextBuilder::new(username)
    }

    pub fn users(&self) -> &Arc<MemoryDirectory<dyn User>> {
        &self.users
    }

    pub fn user_groups(&self) -> &Arc<MemoryDirectory<dyn UserGroup>> {
        &self.user_groups
    }

    pub fn connections(&self) -> &Arc<MemoryDirectory<dyn Connection>> {
        &self.connections
    }

    pub fn connection_groups(&self) -> &Arc<MemoryDirectory<dyn ConnectionGroup>> {
        &self.connection_groups
    }

    /// Whether [`UserContext::invalidate`] has been called.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }

    fn available(&self) -> GatewayResult<()> {
        match &self.unavailable {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl UserContext for MemoryUserContext {
    fn self_user(&self) -> Arc<dyn User> {
        Arc::clone(&self.self_user)
    }

    fn auth_provider_identifier(&self) -> String {
        self.auth_provider.clone()
    }

    fn user_directory(&self) -> GatewayResult<Arc<dyn Directory<dyn User>>> {
        self.available()?;
        Ok(self.users.clone())
    }

    fn user_group_directory(&self) -> GatewayResult<Arc<dyn Directory<dyn UserGroup>>> {
        self.available()?;
        Ok(self.user_groups.clone())
    }

    fn connection_directory(&self) -> GatewayResult<Arc<dyn Directory<dyn Connection>>> {
        self.available()?;
        Ok(self.connections.clone())
    }

    fn connection_group_directory(
        &self,
    ) -> GatewayResult<Arc<dyn Directory<dyn ConnectionGroup>>> {
        self.available()?;
        Ok(self.connection_groups.clone())
    }

    fn root_connection_group(&self) -> GatewayResult<Arc<dyn ConnectionGroup>> {
        self.available()?;
        Ok(Arc::clone(&self.root))
    }

    fn active_connection_identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        self.available()?;
        Ok(self.active_connections.clone())
    }

    fn user_attributes(&self) -> FormSet {
        self.user_forms.clone()
    }

    fn user_group_attributes(&self) -> FormSet {
        self.user_group_forms.clone()
    }

    fn connection_attributes(&self) -> FormSet {
        self.connection_forms.clone()
    }

    fn connection_group_attributes(&self) -> FormSet {
        self.connection_group_forms.clone()
    }

    fn sharing_profile_attributes(&self) -> FormSet {
        self.sharing_profile_forms.clone()
    }

    fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`MemoryUserContext`].
pub struct MemoryUserContextBuilder {
    self_user: MemoryUser,
    auth_provider: String,
    users: Vec<MemoryUser>,
    user_groups: Vec<MemoryUserGroup>,
    connections: Vec<MemoryConnection>,
    connection_groups: Vec<MemoryConnectionGroup>,
    active_connections: BTreeSet<String>,
    user_forms: FormSet,
    user_group_forms: FormSet,
    connection_forms: FormSet,
    connection_group_forms: FormSet,
    sharing_profile_forms: FormSet,
    unavailable: Option<GatewayError>,
}

impl MemoryUserContextBuilder {
    fn new(username: impl Into<String>) -> Self {
        Self {
            self_user: MemoryUser::new(username),
            auth_provider: DEFAULT_AUTH_PROVIDER.to_string(),
            users: Vec::new(),
            user_groups: Vec::new(),
            connections: Vec::new(),
            connection_groups: Vec::new(),
            active_connections: BTreeSet::new(),
            user_forms: FormSet::new(),
            user_group_forms: FormSet::new(),
            connection_forms: FormSet::new(),
            connection_group_forms: FormSet::new(),
            sharing_profile_forms: FormSet::new(),
            unavailable: None,
        }
    }

    /// Replaces the logged-in user. It is also stored in the user directory.
    pub fn with_self_user(mut self, user: MemoryUser) -> Self {
        self.self_user = user;
        self
    }

    pub fn with_auth_provider(mut self, identifier: impl Into<String>) -> Self {
        self.auth_provider = identifier.into();
        self
    }

    pub fn with_user(mut self, user: MemoryUser) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_user_group(mut self, group: MemoryUserGroup) -> Self {
        self.user_groups.push(group);
        self
    }

    pub fn with_connection(mut self, connection: MemoryConnection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn with_connection_group(mut self, group: MemoryConnectionGroup) -> Self {
        self.connection_groups.push(group);
        self
    }

    pub fn with_active_connection(mut self, identifier: impl Into<String>) -> Self {
        self.active_connections.insert(identifier.into());
        self
    }

    pub fn with_user_form(mut self, form: Form) -> Self {
        self.user_forms.insert(form);
        self
    }

    pub fn with_user_group_form(mut self, form: Form) -> Self {
        self.user_group_forms.insert(form);
        self
    }

    pub fn with_connection_form(mut self, form: Form) -> Self {
        self.connection_forms.insert(form);
        self
    }

    pub fn with_connection_group_form(mut self, form: Form) -> Self {
        self.connection_group_forms.insert(form);
        self
    }

    pub fn with_sharing_profile_form(mut self, form: Form) -> Self {
        self.sharing_profile_forms.insert(form);
        self
    }

    /// Makes every directory accessor, the root group and the active
    /// connection list fail with `error`.
    pub fn unavailable(mut self, error: GatewayError) -> Self {
        self.unavailable = Some(error);
        self
    }

    pub fn build(self) -> MemoryUserContext {
        let self_user: Arc<dyn User> = Arc::new(self.self_user);

        let users = Arc::new(MemoryDirectory::<dyn User>::new());
        users.insert(Arc::clone(&self_user));
        for user in self.users {
            users.insert(Arc::new(user));
        }

        let user_groups = Arc::new(MemoryDirectory::<dyn UserGroup>::new());
        for group in self.user_groups {
            user_groups.insert(Arc::new(group));
        }

        let mut root = MemoryConnectionGroup::new(ROOT_GROUP_IDENTIFIER, ROOT_GROUP_IDENTIFIER);

        let connections = Arc::new(MemoryDirectory::<dyn Connection>::new());
        for connection in self.connections {
            if connection.parent_identifier().is_none() {
                root = root.with_connection(connection.identifier().unwrap_or_default());
            }
            connections.insert(Arc::new(connection));
        }

        let connection_groups = Arc::new(MemoryDirectory::<dyn ConnectionGroup>::new());
        for group in self.connection_groups {
            if group.parent_identifier().is_none() {
                root = root.with_child_group(group.identifier().unwrap_or_default());
            }
            connection_groups.insert(Arc::new(group));
        }

        MemoryUserContext {
            self_user,
            auth_provider: self.auth_provider,
            users,
            user_groups,
            connections,
            connection_groups,
            root: Arc::new(root),
            active_connections: self.active_connections,
            user_forms: self.user_forms,
            user_group_forms: self.user_group_forms,
            connection_forms: self.connection_forms,
            connection_group_forms: self.connection_group_forms,
            sharing_profile_forms: self.sharing_profile_forms,
            unavailable: self.unavailable,
            invalidated: AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_user_is_in_the_user_directory() {
        let context = MemoryUserContext::builder("alice")
            .with_user(MemoryUser::new("bob"))
            .build();

        let stored = context.users().stored("alice").unwrap();
        assert!(Arc::ptr_eq(&stored, &context.self_user()));
        assert_eq!(context.users().len(), 2);
    }

    #[test]
    fn root_group_lists_top_level_objects() {
        let context = MemoryUserContext::builder("alice")
            .with_connection(MemoryConnection::new("1", "top"))
            .with_connection(MemoryConnection::new("2", "nested").with_parent("9"))
            .with_connection_group(MemoryConnectionGroup::new("9", "folder"))
            .build();

        let root = context.root_connection_group().unwrap();
        assert_eq!(
            root.connection_identifiers().unwrap(),
            BTreeSet::from(["1".to_string()])
        );
        assert_eq!(
            root.connection_group_identifiers().unwrap(),
            BTreeSet::from(["9".to_string()])
        );
    }

    #[test]
    fn unavailable_context_fails_directory_access() {
        let error = GatewayError::Unavailable("database".to_string());
        let context = MemoryUserContext::builder("alice")
            .unavailable(error.clone())
            .build();

        assert_eq!(context.connection_directory().err(), Some(error.clone()));
        assert_eq!(context.active_connection_identifiers().err(), Some(error));
        assert_eq!(context.self_user().identifier().as_deref(), Some("alice"));
    }

    #[test]
    fn invalidate_is_recorded() {
        let context = MemoryUserContext::builder("alice").build();
        assert!(!context.is_invalidated());
        context.invalidate();
        assert!(context.is_invalidated());
    }
}
