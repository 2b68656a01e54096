use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tollgate_types::{
    Attributed, Attributes, GatewayResult, Identifiable, ObjectKind, ObjectPermission,
    Permissions, SystemPermission, User,
};

use super::Undecorate;
use crate::attributes::{expose_restrictions, normalize_restrictions};

/// A user whose login restrictions are exposed for editing.
///
/// Login restrictions are enforced when the session is created, not here.
pub struct RestrictUser {
    user: Arc<dyn User>,
}

impl RestrictUser {
    pub fn new(user: Arc<dyn User>) -> Self {
        Self { user }
    }
}

impl Undecorate for RestrictUser {
    type Undecorated = dyn User;

    fn undecorated(&self) -> Arc<dyn User> {
        Arc::clone(&self.user)
    }
}

impl Identifiable for RestrictUser {
    fn identifier(&self) -> Option<String> {
        self.user.identifier()
    }

    fn set_identifier(&self, identifier: Option<String>) {
        self.user.set_identifier(identifier);
    }
}

impl Attributed for RestrictUser {
    fn attributes(&self) -> Attributes {
        expose_restrictions(self.user.attributes())
    }

    fn set_attributes(&self, attributes: Attributes) {
        self.user.set_attributes(normalize_restrictions(attributes));
    }
}

impl Permissions for RestrictUser {
    fn system_permissions(&self) -> GatewayResult<BTreeSet<SystemPermission>> {
        self.user.system_permissions()
    }

    fn object_permissions(&self, kind: ObjectKind) -> GatewayResult<BTreeSet<ObjectPermission>> {
        self.user.object_permissions(kind)
    }

    fn user_groups(&self) -> GatewayResult<BTreeSet<String>> {
        self.user.user_groups()
    }
}

impl User for RestrictUser {
    fn password(&self) -> Option<String> {
        self.user.password()
    }

    fn set_password(&self, password: Option<String>) {
        self.user.set_password(password);
    }

    fn last_active(&self) -> Option<DateTime<Utc>> {
        self.user.last_active()
    }
}
