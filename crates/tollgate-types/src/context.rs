//! The per-session authorization view.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    Connection, ConnectionGroup, Directory, FormSet, GatewayResult, User, UserGroup,
};

/// Everything a logged-in user can see and manage through one
/// authentication provider.
///
/// Extensions wrap a host `UserContext` to adjust what it returns. A wrapper
/// is expected to forward every method it does not explicitly change.
pub trait UserContext: Send + Sync {
    /// The user this context belongs to.
    fn self_user(&self) -> Arc<dyn User>;

    /// Identifier of the authentication provider that produced this context.
    fn auth_provider_identifier(&self) -> String;

    fn user_directory(&self) -> GatewayResult<Arc<dyn Directory<dyn User>>>;
    fn user_group_directory(&self) -> GatewayResult<Arc<dyn Directory<dyn UserGroup>>>;
    fn connection_directory(&self) -> GatewayResult<Arc<dyn Directory<dyn Connection>>>;
    fn connection_group_directory(&self)
    -> GatewayResult<Arc<dyn Directory<dyn ConnectionGroup>>>;

    /// The root of the connection group tree.
    fn root_connection_group(&self) -> GatewayResult<Arc<dyn ConnectionGroup>>;

    /// Identifiers of tunnels currently active and visible to this user.
    fn active_connection_identifiers(&self) -> GatewayResult<BTreeSet<String>>;

    /// Attribute schema for each entity kind.
    fn user_attributes(&self) -> FormSet;
    fn user_group_attributes(&self) -> FormSet;
    fn connection_attributes(&self) -> FormSet;
    fn connection_group_attributes(&self) -> FormSet;
    fn sharing_profile_attributes(&self) -> FormSet;

    /// Releases resources held by this context when the session ends.
    fn invalidate(&self);
}
