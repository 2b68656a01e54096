//! Entity capability traits.
//!
//! The host owns every entity. Implementations are shared behind `Arc`, so
//! setters take `&self` and implementations use interior mutability.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AsAnyArc, GatewayResult};

/// Arbitrary attributes attached to an entity. `None` means "unset".
pub type Attributes = BTreeMap<String, Option<String>>;

/// Parameter tokens substituted into connection parameters at connect time.
pub type Tokens = BTreeMap<String, String>;

// ============================================================================
// Shared capabilities
// ============================================================================

/// An object addressed by a string identifier unique within its directory.
pub trait Identifiable: Send + Sync {
    /// Returns the identifier, or `None` if not yet assigned by the store.
    fn identifier(&self) -> Option<String>;

    /// Sets the identifier.
    fn set_identifier(&self, identifier: Option<String>);
}

/// An object carrying arbitrary named attributes.
pub trait Attributed: Send + Sync {
    /// Returns a copy of all attributes.
    fn attributes(&self) -> Attributes;

    /// Replaces the given attributes. Attributes not present are left as-is.
    fn set_attributes(&self, attributes: Attributes);
}

/// Client-side display properties sent with a connect request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub optimal_width: u32,
    pub optimal_height: u32,
    pub optimal_resolution: u32,
    pub timezone: Option<String>,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            optimal_width: 1024,
            optimal_height: 768,
            optimal_resolution: 96,
            timezone: None,
        }
    }
}

/// An established tunnel to a remote desktop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    /// Unique tunnel identifier.
    pub uuid: String,
    /// Identifier of the connection (or group) the tunnel was opened through.
    pub target: String,
}

/// An object through which a remote desktop can be reached.
pub trait Connectable: Send + Sync {
    /// Opens a new tunnel.
    fn connect(&self, info: &ClientInfo, tokens: &Tokens) -> GatewayResult<Tunnel>;

    /// Returns the number of currently active tunnels.
    fn active_connections(&self) -> usize;
}

// ============================================================================
// Permissions
// ============================================================================

/// System-wide permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemPermission {
    Administer,
    CreateConnection,
    CreateConnectionGroup,
    CreateSharingProfile,
    CreateUser,
    CreateUserGroup,
    Audit,
}

/// Kinds of objects that permissions can be granted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Connection,
    ConnectionGroup,
    SharingProfile,
    User,
    UserGroup,
}

/// Operations that can be granted on a single object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectPermissionType {
    Read,
    Update,
    Delete,
    Administer,
}

/// A permission on a single object, by identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectPermission {
    pub permission: ObjectPermissionType,
    pub identifier: String,
}

impl ObjectPermission {
    pub fn new(permission: ObjectPermissionType, identifier: impl Into<String>) -> Self {
        Self {
            permission,
            identifier: identifier.into(),
        }
    }
}

/// An object which can be granted permissions and belong to user groups.
pub trait Permissions: Send + Sync {
    /// Returns the system permissions granted directly to this object.
    fn system_permissions(&self) -> GatewayResult<BTreeSet<SystemPermission>>;

    /// Returns the permissions granted directly on objects of the given kind.
    fn object_permissions(&self, kind: ObjectKind) -> GatewayResult<BTreeSet<ObjectPermission>>;

    /// Returns identifiers of the user groups this object is a direct member of.
    fn user_groups(&self) -> GatewayResult<BTreeSet<String>>;
}

// ============================================================================
// Entities
// ============================================================================

/// Protocol and parameters of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfiguration {
    pub protocol: String,
    pub parameters: BTreeMap<String, String>,
}

impl ConnectionConfiguration {
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// A configured remote desktop connection.
pub trait Connection: Identifiable + Attributed + Connectable + AsAnyArc {
    fn name(&self) -> String;
    fn set_name(&self, name: String);

    /// Identifier of the containing connection group.
    fn parent_identifier(&self) -> Option<String>;
    fn set_parent_identifier(&self, parent: Option<String>);

    fn configuration(&self) -> ConnectionConfiguration;
    fn set_configuration(&self, configuration: ConnectionConfiguration);

    /// When this connection was last used, if ever.
    fn last_active(&self) -> Option<DateTime<Utc>>;

    fn sharing_profile_identifiers(&self) -> GatewayResult<BTreeSet<String>>;
}

/// How a connection group behaves when connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionGroupType {
    /// Purely organizational; cannot be connected to.
    Organizational,
    /// Connecting picks the least-loaded child connection.
    Balancing,
}

/// A group of connections and nested connection groups.
pub trait ConnectionGroup: Identifiable + Attributed + Connectable + AsAnyArc {
    fn name(&self) -> String;
    fn set_name(&self, name: String);

    fn parent_identifier(&self) -> Option<String>;
    fn set_parent_identifier(&self, parent: Option<String>);

    fn group_type(&self) -> ConnectionGroupType;
    fn set_group_type(&self, group_type: ConnectionGroupType);

    fn connection_identifiers(&self) -> GatewayResult<BTreeSet<String>>;
    fn connection_group_identifiers(&self) -> GatewayResult<BTreeSet<String>>;
}

/// A user account. The identifier is the username.
pub trait User: Identifiable + Attributed + Permissions + AsAnyArc {
    /// Returns the password if the store exposes it (most stores return `None`).
    fn password(&self) -> Option<String>;
    fn set_password(&self, password: Option<String>);

    fn last_active(&self) -> Option<DateTime<Utc>>;
}

/// A named group of users and nested user groups.
pub trait UserGroup: Identifiable + Attributed + Permissions + AsAnyArc {
    fn member_users(&self) -> GatewayResult<BTreeSet<String>>;
    fn member_user_groups(&self) -> GatewayResult<BTreeSet<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_configuration_builder() {
        let config = ConnectionConfiguration::new("rdp")
            .with_parameter("hostname", "10.0.0.5")
            .with_parameter("port", "3389");

        assert_eq!(config.protocol, "rdp");
        assert_eq!(config.parameters.len(), 2);
        assert_eq!(config.parameters["port"], "3389");
    }

    #[test]
    fn permission_serialization_uses_host_names() {
        let json = serde_json::to_string(&SystemPermission::CreateUserGroup).unwrap();
        assert_eq!(json, "\"CREATE_USER_GROUP\"");

        let json = serde_json::to_string(&ConnectionGroupType::Balancing).unwrap();
        assert_eq!(json, "\"BALANCING\"");
    }

    #[test]
    fn object_permissions_order_by_type_then_identifier() {
        let mut set = BTreeSet::new();
        set.insert(ObjectPermission::new(ObjectPermissionType::Update, "2"));
        set.insert(ObjectPermission::new(ObjectPermissionType::Read, "9"));
        set.insert(ObjectPermission::new(ObjectPermissionType::Read, "1"));

        let ordered: Vec<_> = set.iter().map(|p| (p.permission, p.identifier.as_str())).collect();
        assert_eq!(
            ordered,
            vec![
                (ObjectPermissionType::Read, "1"),
                (ObjectPermissionType::Read, "9"),
                (ObjectPermissionType::Update, "2"),
            ]
        );
    }
}
