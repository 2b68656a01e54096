use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tollgate_types::{
    Attributed, Attributes, ClientInfo, Connectable, Connection, ConnectionConfiguration,
    GatewayResult, Identifiable, Tokens, Tunnel,
};

use super::{Undecorate, describe};
use crate::attributes::{expose_restrictions, normalize_restrictions};
use crate::verification::RestrictionVerifier;

/// A connection whose restrictions are verified before connecting.
pub struct RestrictConnection {
    connection: Arc<dyn Connection>,
    /// Address the current user logged in from, if known.
    remote_address: Option<String>,
    verifier: Arc<RestrictionVerifier>,
}

impl RestrictConnection {
    pub fn new(
        connection: Arc<dyn Connection>,
        remote_address: Option<String>,
        verifier: Arc<RestrictionVerifier>,
    ) -> Self {
        Self {
            connection,
            remote_address,
            verifier,
        }
    }

    pub fn remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }
}

impl Undecorate for RestrictConnection {
    type Undecorated = dyn Connection;

    fn undecorated(&self) -> Arc<dyn Connection> {
        Arc::clone(&self.connection)
    }
}

impl Identifiable for RestrictConnection {
    fn identifier(&self) -> Option<String> {
        self.connection.identifier()
    }

    fn set_identifier(&self, identifier: Option<String>) {
        self.connection.set_identifier(identifier);
    }
}

impl Attributed for RestrictConnection {
    fn attributes(&self) -> Attributes {
        expose_restrictions(self.connection.attributes())
    }

    fn set_attributes(&self, attributes: Attributes) {
        self.connection
            .set_attributes(normalize_restrictions(attributes));
    }
}

impl Connectable for RestrictConnection {
    fn connect(&self, info: &ClientInfo, tokens: &Tokens) -> GatewayResult<Tunnel> {
        if self.verifier.enforces_connections() {
            self.verifier.verify(
                &describe("connection", self.connection.identifier()),
                &self.connection.attributes(),
                self.remote_address.as_deref(),
            )?;
        }
        self.connection.connect(info, tokens)
    }

    fn active_connections(&self) -> usize {
        self.connection.active_connections()
    }
}

impl Connection for RestrictConnection {
    fn name(&self) -> String {
        self.connection.name()
    }

    fn set_name(&self, name: String) {
        self.connection.set_name(name);
    }

    fn parent_identifier(&self) -> Option<String> {
        self.connection.parent_identifier()
    }

    fn set_parent_identifier(&self, parent: Option<String>) {
        self.connection.set_parent_identifier(parent);
    }

    fn configuration(&self) -> ConnectionConfiguration {
        self.connection.configuration()
    }

    fn set_configuration(&self, configuration: ConnectionConfiguration) {
        self.connection.set_configuration(configuration);
    }

    fn last_active(&self) -> Option<DateTime<Utc>> {
        self.connection.last_active()
    }

    fn sharing_profile_identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        self.connection.sharing_profile_identifiers()
    }
}
