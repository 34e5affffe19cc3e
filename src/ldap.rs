//! LDAP-backed [`DirectoryClient`].

use std::sync::Arc;

use ldap3::{Ldap as Ldap3, LdapConnAsync, Scope, SearchEntry};

use crate::client::{DirectoryClient, Entry};
use crate::config::Parameters;
use crate::error::{Error, Result};

/// `invalidCredentials` result code.
const INVALID_CREDENTIALS: u32 = 49;

/// Run the connection I/O loop in the background.
fn drive(conn: LdapConnAsync) {
    tokio::spawn(async move {
        if let Err(err) = conn.drive().await {
            tracing::warn!(%err, "directory connection error");
        }
    });
}

/// Directory client over an [`Ldap3`] connection.
///
/// The connection established by [`Ldap::connect`] serves searches;
/// credential binds each open a short-lived connection of their own,
/// so a declined bind never poisons the search connection.
#[derive(Clone, Debug)]
pub struct Ldap {
    conn: Ldap3,
    params: Arc<Parameters>,
}

impl Ldap {
    /// Connect to the configured address and, when a service identity
    /// is configured, bind the search connection with it.
    pub async fn connect(params: Arc<Parameters>) -> Result<Self> {
        let (handle, mut conn) =
            LdapConnAsync::new(&params.connection.address).await?;
        drive(handle);

        if let Some(user) = &params.connection.user {
            let password =
                params.connection.password.as_deref().ok_or(
                    Error::Precondition(
                        "service bind user configured without a password",
                    ),
                )?;
            conn.simple_bind(user, password).await?.success()?;
        }

        Ok(Self { conn, params })
    }
}

impl DirectoryClient for Ldap {
    fn parameters(&self) -> &Parameters {
        &self.params
    }

    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
        attributes: Option<&[String]>,
    ) -> Result<Vec<Entry>> {
        // an empty attribute list requests everything.
        let wanted: Vec<&str> = attributes
            .map(|attrs| attrs.iter().map(String::as_str).collect())
            .unwrap_or_default();

        let (results, _) = self
            .conn
            .search(base_dn, Scope::Subtree, filter, wanted)
            .await?
            .success()?;

        Ok(results
            .into_iter()
            .map(|result| {
                let entry = SearchEntry::construct(result);
                Entry { dn: entry.dn, attributes: entry.attrs }
            })
            .collect())
    }

    async fn bind(&mut self, identity: &str, password: &str) -> Result<bool> {
        let (handle, mut conn) =
            LdapConnAsync::new(&self.params.connection.address).await?;
        drive(handle);

        let result = conn.simple_bind(identity, password).await?;
        if result.rc == INVALID_CREDENTIALS {
            conn.unbind().await?;
            return Ok(false);
        }
        result.success()?;
        conn.unbind().await?;
        Ok(true)
    }
}
