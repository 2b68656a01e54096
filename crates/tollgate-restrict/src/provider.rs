//! Login-time entry point.
//!
//! The host calls [`RestrictAuthProvider::decorate`] once per login with the
//! user context produced by another extension. Login restrictions are
//! verified there, before any decorated context exists.

use std::sync::Arc;

use tollgate_config::TollgateConfig;
use tollgate_types::{GatewayResult, UserContext};
use tracing::debug;

use crate::context::RestrictUserContext;
use crate::verification::RestrictionVerifier;

/// Applies login restrictions and wraps user contexts with
/// [`RestrictUserContext`].
pub struct RestrictAuthProvider {
    verifier: Arc<RestrictionVerifier>,
}

impl RestrictAuthProvider {
    /// Identifier under which this extension registers with the host.
    pub const IDENTIFIER: &'static str = "restrict";

    pub fn new(config: &TollgateConfig) -> Self {
        Self {
            verifier: Arc::new(RestrictionVerifier::from_config(config)),
        }
    }

    pub fn with_verifier(verifier: RestrictionVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    pub fn verifier(&self) -> &RestrictionVerifier {
        &self.verifier
    }

    /// Verifies login restrictions, then wraps `context`.
    ///
    /// Denial is returned as [`GatewayError::Security`](tollgate_types::GatewayError::Security)
    /// and no context is produced. Host errors raised while reading the user
    /// or its groups are returned unchanged.
    pub fn decorate(
        &self,
        context: Arc<dyn UserContext>,
        remote_address: Option<String>,
    ) -> GatewayResult<Arc<dyn UserContext>> {
        if self.verifier.enforces_login() {
            self.verify_login(context.as_ref(), remote_address.as_deref())?;
        }

        let decorated = RestrictUserContext::new(context, remote_address)
            .with_verifier(Arc::clone(&self.verifier));
        Ok(Arc::new(decorated))
    }

    /// Verifies the restrictions of the logged-in user and of every group
    /// the user directly belongs to.
    pub fn verify_login(
        &self,
        context: &dyn UserContext,
        remote_address: Option<&str>,
    ) -> GatewayResult<()> {
        let user = context.self_user();
        let username = user.identifier().unwrap_or_default();

        self.verifier
            .verify(&format!("user {username}"), &user.attributes(), remote_address)?;

        let groups: Vec<String> = user.user_groups()?.into_iter().collect();
        if !groups.is_empty() {
            let directory = context.user_group_directory()?;
            for group in directory.get_all(&groups)? {
                let name = group.identifier().unwrap_or_default();
                self.verifier.verify(
                    &format!("user group {name}"),
                    &group.attributes(),
                    remote_address,
                )?;
            }
        }

        debug!(
            user = %username,
            groups = groups.len(),
            remote_address = ?remote_address,
            "Login restrictions satisfied"
        );
        Ok(())
    }
}

impl Default for RestrictAuthProvider {
    fn default() -> Self {
        Self::new(&TollgateConfig::default())
    }
}
