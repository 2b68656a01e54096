//! Plain host entities.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use tollgate_types::{
    Attributed, Attributes, ClientInfo, Connectable, Connection, ConnectionConfiguration,
    ConnectionGroup, ConnectionGroupType, GatewayError, GatewayResult, Identifiable, ObjectKind,
    ObjectPermission, Permissions, SystemPermission, Tokens, Tunnel, User, UserGroup,
};
use uuid::Uuid;

use crate::{read, write};

/// Implements [`Identifiable`] and [`Attributed`] over the `identifier` and
/// `attributes` fields every memory entity carries.
macro_rules! impl_identity {
    ($entity:ty) => {
        impl Identifiable for $entity {
            fn identifier(&self) -> Option<String> {
                read(&self.identifier).clone()
            }

            fn set_identifier(&self, identifier: Option<String>) {
                *write(&self.identifier) = identifier;
            }
        }

        impl Attributed for $entity {
            fn attributes(&self) -> Attributes {
                read(&self.attributes).clone()
            }

            fn set_attributes(&self, attributes: Attributes) {
                write(&self.attributes).extend(attributes);
            }
        }
    };
}

/// Permissions granted directly to a user or user group.
#[derive(Debug, Default)]
struct Grants {
    system: BTreeSet<SystemPermission>,
    objects: BTreeMap<ObjectKind, BTreeSet<ObjectPermission>>,
    groups: BTreeSet<String>,
}

impl Grants {
    fn objects(&self, kind: ObjectKind) -> BTreeSet<ObjectPermission> {
        self.objects.get(&kind).cloned().unwrap_or_default()
    }
}

fn open_tunnel(target: Option<String>) -> Tunnel {
    Tunnel {
        uuid: Uuid::new_v4().to_string(),
        target: target.unwrap_or_default(),
    }
}

// ============================================================================
// Connection
// ============================================================================

/// An in-memory connection. Every successful `connect` is counted.
#[derive(Debug)]
pub struct MemoryConnection {
    identifier: RwLock<Option<String>>,
    attributes: RwLock<Attributes>,
    name: RwLock<String>,
    parent: RwLock<Option<String>>,
    configuration: RwLock<ConnectionConfiguration>,
    last_active: Option<DateTime<Utc>>,
    sharing_profiles: BTreeSet<String>,
    connects: AtomicUsize,
}

impl MemoryConnection {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        let connection = Self::unsaved(name);
        connection.set_identifier(Some(identifier.into()));
        connection
    }

    /// A connection with no identifier yet, as created by an admin form.
    pub fn unsaved(name: impl Into<String>) -> Self {
        Self {
            identifier: RwLock::new(None),
            attributes: RwLock::new(Attributes::new()),
            name: RwLock::new(name.into()),
            parent: RwLock::new(None),
            configuration: RwLock::new(ConnectionConfiguration::new("vnc")),
            last_active: None,
            sharing_profiles: BTreeSet::new(),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        write(&self.attributes).insert(name.into(), Some(value.into()));
        self
    }

    pub fn with_parent(self, parent: impl Into<String>) -> Self {
        *write(&self.parent) = Some(parent.into());
        self
    }

    pub fn with_configuration(self, configuration: ConnectionConfiguration) -> Self {
        *write(&self.configuration) = configuration;
        self
    }

    pub fn with_last_active(mut self, last_active: DateTime<Utc>) -> Self {
        self.last_active = Some(last_active);
        self
    }

    pub fn with_sharing_profile(mut self, identifier: impl Into<String>) -> Self {
        self.sharing_profiles.insert(identifier.into());
        self
    }

    /// Number of tunnels opened through this connection.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl_identity!(MemoryConnection);

impl Connectable for MemoryConnection {
    fn connect(&self, _info: &ClientInfo, _tokens: &Tokens) -> GatewayResult<Tunnel> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(open_tunnel(self.identifier()))
    }

    fn active_connections(&self) -> usize {
        self.connect_count()
    }
}

impl Connection for MemoryConnection {
    fn name(&self) -> String {
        read(&self.name).clone()
    }

    fn set_name(&self, name: String) {
        *write(&self.name) = name;
    }

    fn parent_identifier(&self) -> Option<String> {
        read(&self.parent).clone()
    }

    fn set_parent_identifier(&self, parent: Option<String>) {
        *write(&self.parent) = parent;
    }

    fn configuration(&self) -> ConnectionConfiguration {
        read(&self.configuration).clone()
    }

    fn set_configuration(&self, configuration: ConnectionConfiguration) {
        *write(&self.configuration) = configuration;
    }

    fn last_active(&self) -> Option<DateTime<Utc>> {
        self.last_active
    }

    fn sharing_profile_identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        Ok(self.sharing_profiles.clone())
    }
}

// ============================================================================
// Connection group
// ============================================================================

/// An in-memory connection group.
///
/// Organizational groups refuse `connect`. Balancing groups open a tunnel
/// targeting the group itself.
#[derive(Debug)]
pub struct MemoryConnectionGroup {
    identifier: RwLock<Option<String>>,
    attributes: RwLock<Attributes>,
    name: RwLock<String>,
    parent: RwLock<Option<String>>,
    group_type: RwLock<ConnectionGroupType>,
    connections: BTreeSet<String>,
    groups: BTreeSet<String>,
    connects: AtomicUsize,
}

impl MemoryConnectionGroup {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: RwLock::new(Some(identifier.into())),
            attributes: RwLock::new(Attributes::new()),
            name: RwLock::new(name.into()),
            parent: RwLock::new(None),
            group_type: RwLock::new(ConnectionGroupType::Organizational),
            connections: BTreeSet::new(),
            groups: BTreeSet::new(),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn balancing(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(identifier, name).with_type(ConnectionGroupType::Balancing)
    }

    pub fn with_type(self, group_type: ConnectionGroupType) -> Self {
        *write(&self.group_type) = group_type;
        self
    }

    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        write(&self.attributes).insert(name.into(), Some(value.into()));
        self
    }

    pub fn with_parent(self, parent: impl Into<String>) -> Self {
        *write(&self.parent) = Some(parent.into());
        self
    }

    pub fn with_connection(mut self, identifier: impl Into<String>) -> Self {
        self.connections.insert(identifier.into());
        self
    }

    pub fn with_child_group(mut self, identifier: impl Into<String>) -> Self {
        self.groups.insert(identifier.into());
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl_identity!(MemoryConnectionGroup);

impl Connectable for MemoryConnectionGroup {
    fn connect(&self, _info: &ClientInfo, _tokens: &Tokens) -> GatewayResult<Tunnel> {
        if self.group_type() == ConnectionGroupType::Organizational {
            return Err(GatewayError::Unsupported(format!(
                "connection group {} is organizational",
                self.identifier().unwrap_or_default()
            )));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(open_tunnel(self.identifier()))
    }

    fn active_connections(&self) -> usize {
        self.connect_count()
    }
}

impl ConnectionGroup for MemoryConnectionGroup {
    fn name(&self) -> String {
        read(&self.name).clone()
    }

    fn set_name(&self, name: String) {
        *write(&self.name) = name;
    }

    fn parent_identifier(&self) -> Option<String> {
        read(&self.parent).clone()
    }

    fn set_parent_identifier(&self, parent: Option<String>) {
        *write(&self.parent) = parent;
    }

    fn group_type(&self) -> ConnectionGroupType {
        *read(&self.group_type)
    }

    fn set_group_type(&self, group_type: ConnectionGroupType) {
        *write(&self.group_type) = group_type;
    }

    fn connection_identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        Ok(self.connections.clone())
    }

    fn connection_group_identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        Ok(self.groups.clone())
    }
}

// ============================================================================
// User
// ============================================================================

/// An in-memory user account.
#[derive(Debug)]
pub struct MemoryUser {
    identifier: RwLock<Option<String>>,
    attributes: RwLock<Attributes>,
    password: RwLock<Option<String>>,
    last_active: Option<DateTime<Utc>>,
    grants: Grants,
}

impl MemoryUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            identifier: RwLock::new(Some(username.into())),
            attributes: RwLock::new(Attributes::new()),
            password: RwLock::new(None),
            last_active: None,
            grants: Grants::default(),
        }
    }

    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        write(&self.attributes).insert(name.into(), Some(value.into()));
        self
    }

    pub fn with_password(self, password: impl Into<String>) -> Self {
        *write(&self.password) = Some(password.into());
        self
    }

    pub fn with_last_active(mut self, last_active: DateTime<Utc>) -> Self {
        self.last_active = Some(last_active);
        self
    }

    /// Makes the user a direct member of the given user group.
    pub fn with_group(mut self, identifier: impl Into<String>) -> Self {
        self.grants.groups.insert(identifier.into());
        self
    }

    pub fn with_system_permission(mut self, permission: SystemPermission) -> Self {
        self.grants.system.insert(permission);
        self
    }

    pub fn with_object_permission(mut self, kind: ObjectKind, permission: ObjectPermission) -> Self {
        self.grants.objects.entry(kind).or_default().insert(permission);
        self
    }
}

impl_identity!(MemoryUser);

impl Permissions for MemoryUser {
    fn system_permissions(&self) -> GatewayResult<BTreeSet<SystemPermission>> {
        Ok(self.grants.system.clone())
    }

    fn object_permissions(&self, kind: ObjectKind) -> GatewayResult<BTreeSet<ObjectPermission>> {
        Ok(self.grants.objects(kind))
    }

    fn user_groups(&self) -> GatewayResult<BTreeSet<String>> {
        Ok(self.grants.groups.clone())
    }
}

impl User for MemoryUser {
    fn password(&self) -> Option<String> {
        read(&self.password).clone()
    }

    fn set_password(&self, password: Option<String>) {
        *write(&self.password) = password;
    }

    fn last_active(&self) -> Option<DateTime<Utc>> {
        self.last_active
    }
}

// ============================================================================
// User group
// ============================================================================

/// An in-memory user group.
#[derive(Debug)]
pub struct MemoryUserGroup {
    identifier: RwLock<Option<String>>,
    attributes: RwLock<Attributes>,
    member_users: BTreeSet<String>,
    member_groups: BTreeSet<String>,
    grants: Grants,
}

impl MemoryUserGroup {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: RwLock::new(Some(identifier.into())),
            attributes: RwLock::new(Attributes::new()),
            member_users: BTreeSet::new(),
            member_groups: BTreeSet::new(),
            grants: Grants::default(),
        }
    }

    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        write(&self.attributes).insert(name.into(), Some(value.into()));
        self
    }

    pub fn with_member_user(mut self, username: impl Into<String>) -> Self {
        self.member_users.insert(username.into());
        self
    }

    pub fn with_member_group(mut self, identifier: impl Into<String>) -> Self {
        self.member_groups.insert(identifier.into());
        self
    }

    /// Makes this group a direct member of another user group.
    pub fn with_group(mut self, identifier: impl Into<String>) -> Self {
        self.grants.groups.insert(identifier.into());
        self
    }

    pub fn with_system_permission(mut self, permission: SystemPermission) -> Self {
        self.grants.system.insert(permission);
        self
    }
}

impl_identity!(MemoryUserGroup);

impl Permissions for MemoryUserGroup {
    fn system_permissions(&self) -> GatewayResult<BTreeSet<SystemPermission>> {
        Ok(self.grants.system.clone())
    }

    fn object_permissions(&self, kind: ObjectKind) -> GatewayResult<BTreeSet<ObjectPermission>> {
        Ok(self.grants.objects(kind))
    }

    fn user_groups(&self) -> GatewayResult<BTreeSet<String>> {
        Ok(self.grants.groups.clone())
    }
}

impl UserGroup for MemoryUserGroup {
    fn member_users(&self) -> GatewayResult<BTreeSet<String>> {
        Ok(self.member_users.clone())
    }

    fn member_user_groups(&self) -> GatewayResult<BTreeSet<String>> {
        Ok(self.member_groups.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attributes_merges() {
        let user = MemoryUser::new("alice").with_attribute("a", "1");

        let mut update = Attributes::new();
        update.insert("b".to_string(), Some("2".to_string()));
        update.insert("a".to_string(), None);
        user.set_attributes(update);

        let attributes = user.attributes();
        assert_eq!(attributes["a"], None);
        assert_eq!(attributes["b"].as_deref(), Some("2"));
    }

    #[test]
    fn connections_count_tunnels() {
        let connection = MemoryConnection::new("7", "db");

        let tunnel = connection
            .connect(&ClientInfo::default(), &Tokens::new())
            .unwrap();

        assert_eq!(tunnel.target, "7");
        assert_eq!(connection.connect_count(), 1);
    }

    #[test]
    fn organizational_groups_refuse_connect() {
        let group = MemoryConnectionGroup::new("3", "folders");
        let result = group.connect(&ClientInfo::default(), &Tokens::new());
        assert!(matches!(result, Err(GatewayError::Unsupported(_))));

        let group = MemoryConnectionGroup::balancing("4", "pool");
        assert!(group.connect(&ClientInfo::default(), &Tokens::new()).is_ok());
        assert_eq!(group.connect_count(), 1);
    }
}
