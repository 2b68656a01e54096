use std::collections::BTreeSet;
use std::sync::Arc;

use tollgate_types::{
    Attributed, Attributes, GatewayResult, Identifiable, ObjectKind, ObjectPermission,
    Permissions, SystemPermission, UserGroup,
};

use super::Undecorate;
use crate::attributes::{expose_restrictions, normalize_restrictions};

/// A user group whose login restrictions are exposed for editing.
pub struct RestrictUserGroup {
    group: Arc<dyn UserGroup>,
}

impl RestrictUserGroup {
    pub fn new(group: Arc<dyn UserGroup>) -> Self {
        Self { group }
    }
}

impl Undecorate for RestrictUserGroup {
    type Undecorated = dyn UserGroup;

    fn undecorated(&self) -> Arc<dyn UserGroup> {
        Arc::clone(&self.group)
    }
}

impl Identifiable for RestrictUserGroup {
    fn identifier(&self) -> Option<String> {
        self.group.identifier()
    }

    fn set_identifier(&self, identifier: Option<String>) {
        self.group.set_identifier(identifier);
    }
}

impl Attributed for RestrictUserGroup {
    fn attributes(&self) -> Attributes {
        expose_restrictions(self.group.attributes())
    }

    fn set_attributes(&self, attributes: Attributes) {
        self.group.set_attributes(normalize_restrictions(attributes));
    }
}

impl Permissions for RestrictUserGroup {
    fn system_permissions(&self) -> GatewayResult<BTreeSet<SystemPermission>> {
        self.group.system_permissions()
    }

    fn object_permissions(&self, kind: ObjectKind) -> GatewayResult<BTreeSet<ObjectPermission>> {
        self.group.object_permissions(kind)
    }

    fn user_groups(&self) -> GatewayResult<BTreeSet<String>> {
        self.group.user_groups()
    }
}

impl UserGroup for RestrictUserGroup {
    fn member_users(&self) -> GatewayResult<BTreeSet<String>> {
        self.group.member_users()
    }

    fn member_user_groups(&self) -> GatewayResult<BTreeSet<String>> {
        self.group.member_user_groups()
    }
}
