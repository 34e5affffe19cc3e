//! Configuration manager for ldauth.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Everything the authentication core reads. Owned by the directory
/// client, read-only to the resolvers.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Related to the directory connection itself.
    pub connection: Connection,
    /// Related to username lookup.
    pub user: UserParameters,
    /// Related to group-membership resolution.
    /// `None` is tolerated only with [`ClientParameters::skip_roles`].
    pub role: Option<RoleParameters>,
    /// Client-level behavior switches.
    #[serde(default)]
    pub client: ClientParameters,
}

/// Directory connection configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// URL for the LDAP instance, e.g. `ldap://localhost:2389`.
    pub address: String,
    /// Service DN credential for the search connection.
    pub user: Option<String>,
    /// Password credential for the search connection.
    pub password: Option<String>,
}

/// Username lookup configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserParameters {
    /// DN the user search is bounded by.
    pub base_dn: String,
    /// Extra filter ANDed into every generated user query.
    pub filter: Option<String>,
    /// Attribute matched against the supplied username, e.g. `uid`.
    pub name_attribute: String,
    /// Attribute names surfaced on the resolved identity.
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// Group-membership resolution configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleParameters {
    /// DN the role search is bounded by.
    pub base_dn: String,
    /// Extra filter ANDed into every generated role query.
    pub filter: Option<String>,
    /// Attribute on role entries holding the member key, e.g. `member`.
    pub user_attribute: String,
    /// Attribute holding the role's display name, e.g. `cn`.
    pub name_attribute: String,
    /// Which identifying key is matched against `user_attribute`.
    #[serde(default)]
    pub user_id: UserIdField,
    /// Walk nested group memberships.
    #[serde(default)]
    pub recursive_search: bool,
}

/// Identifying key matched against [`RoleParameters::user_attribute`].
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UserIdField {
    /// The resolved entry's distinguished name.
    #[default]
    Dn,
    /// The raw username supplied by the caller.
    Username,
}

impl UserIdField {
    /// Attribute name requested from role entries for this key kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dn => "dn",
            Self::Username => "username",
        }
    }
}

/// Client-level behavior switches.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientParameters {
    /// Tolerate an absent `role` section; identities then carry no
    /// resolved roles.
    #[serde(default)]
    pub skip_roles: bool,
    /// Template for the bind-then-search identity. The `&username&`
    /// placeholder is substituted with the raw username.
    pub bind_user_pattern: Option<String>,
}

impl Parameters {
    /// Reads parameters from a YAML file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Reads parameters from the default `config.yaml` location.
    pub fn read_default() -> Result<Self> {
        Self::read(DEFAULT_CONFIG_PATH)
    }
}
