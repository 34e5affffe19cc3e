//! Authentication strategies over a directory client.

use std::collections::BTreeSet;

use crate::client::DirectoryClient;
use crate::config::UserIdField;
use crate::error::{Error, Result};
use crate::roles;
use crate::user::{self, DirectoryUser};

/// Placeholder substituted with the raw username in
/// `client.bind_user_pattern`.
const USERNAME_PLACEHOLDER: &str = "&username&";

/// How role attachment ended for a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleOutcome {
    /// Role resolution ran; the set may be empty.
    Resolved(BTreeSet<String>),
    /// No `role` section configured and `skip_roles` tolerates it;
    /// the identity carries no resolved roles.
    Skipped,
}

/// Composes user resolution, role resolution and the credential bind.
///
/// Owns the directory client for the duration of its attempts.
/// Attempts are independent; each produces its own [`DirectoryUser`].
pub struct Authenticator<C> {
    client: C,
}

impl<C: DirectoryClient> Authenticator<C> {
    /// Create a new [`Authenticator`] over `client`.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Shared directory client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Mutable access for callers resolving steps themselves.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Give the directory client back.
    pub fn into_client(self) -> C {
        self.client
    }

    /// Search-then-bind.
    ///
    /// Resolves the user entry, attaches roles, then verifies the
    /// credential by binding as the resolved DN. `Ok(None)` covers the
    /// two expected negative outcomes: no such user, or the directory
    /// declined the credential. The search connection must be able to
    /// read user and role entries; use
    /// [`Self::authenticate_no_anonymous_search`] when it cannot.
    pub async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Option<DirectoryUser>> {
        let Some(mut user) =
            user::resolve_user(&mut self.client, username).await?
        else {
            return Ok(None);
        };
        self.attach_roles(&mut user).await?;

        if !self.client.bind(user.dn(), password).await? {
            tracing::debug!(username, "directory declined the credential");
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Bind-then-search.
    ///
    /// Builds a bind identity from `client.bind_user_pattern` (or the
    /// raw username) and verifies the credential first; only a
    /// successful bind is followed by user and role resolution. Avoids
    /// needing anonymous or service-level read access for the lookup,
    /// at the cost of trusting the pattern to produce a correct
    /// identity string.
    pub async fn authenticate_no_anonymous_search(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Option<DirectoryUser>> {
        user::reject_wildcard(username)?;

        let identity = self.bind_identity(username);
        if !self.client.bind(&identity, password).await? {
            tracing::debug!(
                username,
                %identity,
                "directory declined the credential, skipping lookup"
            );
            return Ok(None);
        }

        let Some(mut user) =
            user::resolve_user(&mut self.client, username).await?
        else {
            return Ok(None);
        };
        self.attach_roles(&mut user).await?;
        Ok(Some(user))
    }

    /// Attach resolved roles to `user`, keyed per the configured
    /// `user_id` field. A missing `role` section is tolerated only
    /// when `skip_roles` is set; the returned outcome says which way
    /// it went.
    pub async fn attach_roles(
        &mut self,
        user: &mut DirectoryUser,
    ) -> Result<RoleOutcome> {
        let params = self.client.parameters();
        let Some(role) = params.role.clone() else {
            if params.client.skip_roles {
                tracing::warn!(
                    username = user.username(),
                    "no `role` configuration, skipping role resolution"
                );
                return Ok(RoleOutcome::Skipped);
            }
            return Err(Error::RoleConfigMissing);
        };

        let key = match role.user_id {
            UserIdField::Dn => user.dn().to_owned(),
            UserIdField::Username => user.username().to_owned(),
        };

        let resolved = roles::resolve_roles(&mut self.client, &key).await?;
        user.set_roles(resolved.clone());
        Ok(RoleOutcome::Resolved(resolved))
    }

    fn bind_identity(&self, username: &str) -> String {
        match &self.client.parameters().client.bind_user_pattern {
            Some(pattern) => {
                pattern.replace(USERNAME_PLACEHOLDER, username)
            },
            None => username.to_owned(),
        }
    }
}
