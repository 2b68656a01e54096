//! The restriction-aware user context.

use std::collections::BTreeSet;
use std::sync::Arc;

use tollgate_types::{
    Connection, ConnectionGroup, Directory, Form, FormSet, GatewayResult, User, UserContext,
    UserGroup,
};
use tracing::debug;

use crate::attributes::{
    RESTRICT_CONNECTION_FORM, RESTRICT_CONNECTION_GROUP_FORM, RESTRICT_LOGIN_FORM,
};
use crate::decorated::{
    RestrictConnection, RestrictConnectionGroup, RestrictUser, RestrictUserGroup,
    unwrap_decorated,
};
use crate::directory::DecoratingDirectory;
use crate::verification::RestrictionVerifier;

/// Wraps another extension's [`UserContext`] to add login and connection
/// restrictions.
///
/// The four entity directories are replaced by decorating views and the four
/// matching attribute schemas gain the restriction form. Every other
/// capability is forwarded to the wrapped context unchanged.
pub struct RestrictUserContext {
    context: Arc<dyn UserContext>,
    /// Address the user logged in from, if known.
    remote_address: Option<String>,
    verifier: Arc<RestrictionVerifier>,
}

impl RestrictUserContext {
    pub fn new(context: Arc<dyn UserContext>, remote_address: Option<String>) -> Self {
        debug!(
            auth_provider = %context.auth_provider_identifier(),
            remote_address = ?remote_address,
            "Wrapping user context with restrictions"
        );
        Self {
            context,
            remote_address,
            verifier: Arc::new(RestrictionVerifier::default()),
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<RestrictionVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }

    /// Returns the wrapped context.
    pub fn undecorated(&self) -> &Arc<dyn UserContext> {
        &self.context
    }
}

/// Adds `form` to a copy of `base`. An equal form already present is kept once.
fn with_form(base: FormSet, form: &Form) -> FormSet {
    let mut forms = base;
    forms.insert(form.clone());
    forms
}

impl UserContext for RestrictUserContext {
    fn self_user(&self) -> Arc<dyn User> {
        self.context.self_user()
    }

    fn auth_provider_identifier(&self) -> String {
        self.context.auth_provider_identifier()
    }

    fn user_directory(&self) -> GatewayResult<Arc<dyn Directory<dyn User>>> {
        let directory = DecoratingDirectory::<dyn User>::new(
            self.context.user_directory()?,
            |user: Arc<dyn User>| -> Arc<dyn User> { Arc::new(RestrictUser::new(user)) },
            unwrap_decorated::<RestrictUser>,
        );
        Ok(Arc::new(directory))
    }

    fn user_group_directory(&self) -> GatewayResult<Arc<dyn Directory<dyn UserGroup>>> {
        let directory = DecoratingDirectory::<dyn UserGroup>::new(
            self.context.user_group_directory()?,
            |group: Arc<dyn UserGroup>| -> Arc<dyn UserGroup> {
                Arc::new(RestrictUserGroup::new(group))
            },
            unwrap_decorated::<RestrictUserGroup>,
        );
        Ok(Arc::new(directory))
    }

    fn connection_directory(&self) -> GatewayResult<Arc<dyn Directory<dyn Connection>>> {
        let remote_address = self.remote_address.clone();
        let verifier = Arc::clone(&self.verifier);

        let directory = DecoratingDirectory::<dyn Connection>::new(
            self.context.connection_directory()?,
            move |connection: Arc<dyn Connection>| -> Arc<dyn Connection> {
                Arc::new(RestrictConnection::new(
                    connection,
                    remote_address.clone(),
                    Arc::clone(&verifier),
                ))
            },
            unwrap_decorated::<RestrictConnection>,
        );
        Ok(Arc::new(directory))
    }

    fn connection_group_directory(
        &self,
    ) -> GatewayResult<Arc<dyn Directory<dyn ConnectionGroup>>> {
        let remote_address = self.remote_address.clone();
        let verifier = Arc::clone(&self.verifier);

        let directory = DecoratingDirectory::<dyn ConnectionGroup>::new(
            self.context.connection_group_directory()?,
            move |group: Arc<dyn ConnectionGroup>| -> Arc<dyn ConnectionGroup> {
                Arc::new(RestrictConnectionGroup::new(
                    group,
                    remote_address.clone(),
                    Arc::clone(&verifier),
                ))
            },
            unwrap_decorated::<RestrictConnectionGroup>,
        );
        Ok(Arc::new(directory))
    }

    fn root_connection_group(&self) -> GatewayResult<Arc<dyn ConnectionGroup>> {
        self.context.root_connection_group()
    }

    fn active_connection_identifiers(&self) -> GatewayResult<BTreeSet<String>> {
        self.context.active_connection_identifiers()
    }

    fn user_attributes(&self) -> FormSet {
        with_form(self.context.user_attributes(), &RESTRICT_LOGIN_FORM)
    }

    fn user_group_attributes(&self) -> FormSet {
        with_form(self.context.user_group_attributes(), &RESTRICT_LOGIN_FORM)
    }

    fn connection_attributes(&self) -> FormSet {
        with_form(self.context.connection_attributes(), &RESTRICT_CONNECTION_FORM)
    }

    fn connection_group_attributes(&self) -> FormSet {
        with_form(
            self.context.connection_group_attributes(),
            &RESTRICT_CONNECTION_GROUP_FORM,
        )
    }

    fn sharing_profile_attributes(&self) -> FormSet {
        self.context.sharing_profile_attributes()
    }

    fn invalidate(&self) {
        self.context.invalidate();
    }
}
