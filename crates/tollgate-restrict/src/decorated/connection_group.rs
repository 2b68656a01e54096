use std::collections::BTreeSet;
use std::sync::Arc;

use tollgate_types::{
    Attributed, Attributes, ClientInfo, Connectable, ConnectionGroup, ConnectionGroupType,
    GatewayResult, Identifiable, Tokens, Tunnel,
};

use super::{Undecorate, describe};
use crate::attributes::{expose_restrictions, normalize_restrictions};
use crate::verification::RestrictionVerifier;

/// A connection group whose restrictions are verified before connecting.
///
/// Only the group's own restrictions are checked here. When a balancing
/// group picks a child connection, the host connects to that child
/// directly, bypassing this wrapper.
pub struct RestrictConnectionGroup {
    group: Arc<dyn ConnectionGroup>,
    remote_address: Option<String>,
    verifier: Arc<RestrictionVerifier>,
}

impl RestrictConnectionGroup {
    pub fn new(
        group: Arc<dyn ConnectionGroup>,
        remote_address: Option<String>,
        verifier: Arc<RestrictionVerifier>,
    ) -> Self {
        Self {
            group,
            remote_address,
            verifier,
        }
    }

    pub fn remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }
}

impl Undecorate for RestrictConnectionGroup {
    type Undecorated = dyn ConnectionGroup;

    fn undecorated(&self) -> Arc<dyn ConnectionGroup> {
        Arc::clone(&self.group)
    }
}

impl Identifiable for RestrictConnectionGroup {
    fn identifier(&self) -> Option<String> {
        self.group.identifier()
    }

    fn set_identifier(&self, identifier: Option<String>) {
        self.group.set_identifier(identifier);
    }
}

impl Attributed for RestrictConnectionGroup {
    fn attributes(&self) -> Attributes {
        expose_restrictions(self.group.attributes())
    }

    fn set_attributes(&self, attributes: Attributes) {
        self.group.set_attributes(normalize_restrictions(attributes));
    }
}

impl Connectable for RestrictConnectionGroup {
    fn connect(&self, info: &ClientInfo, tokens: &Tokens) -> GatewayResult<Tunnel> {
        if self.verifier.enforces_connections() {
            self.verifier.verify(
                &describe("connection group", self.group.identifier()),
                &self.group.attributes(),
                self.remote_address.as_deref(),
            )?;
        }
        self.group.connect(info, tokens)
    }

    fn active_connections(&self) -> usize {
        self.group.active_connections()
    }
}

impl ConnectionGroup for RestrictConnectionGroup {
    fn name(&self) -> String {
        self.group.name()
    }

    fn set_name(&self, name: String) {
        self.group.set_name(name);
    }

    fn parent_identifier(&self) -> Option<String> {
        self.group.parent_identifier()
    }

    fn set_parent_identifier(&self, parent: Option<String>) {
        self.group.set_parent_identifier(parent);
    }

    fn group_type(&self) -> ConnectionGroupType {
        self.group.group_type()
    }

    fn set_group_type(&self, group_type: ConnectionGroupType) {
        self.group.set_group_type(group_type);
    }

    fn connection_identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        self.group.connection_identifiers()
    }

    fn connection_group_identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        self.group.connection_group_identifiers()
    }
}
