//! Error handler for ldauth.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing authentication-core errors.
///
/// "User not found" and "credential rejected" are expected negative
/// outcomes and are never represented here; they surface as `Ok(None)`
/// or `Ok(false)` from the operations that produce them. Everything in
/// this enum aborts the current attempt.
#[derive(Debug, Error)]
pub enum Error {
    /// The wildcard username `*` was supplied. Rejected before any
    /// directory call is made.
    #[error("invalid username given")]
    InvalidUsername,

    /// A username search matched more than one directory entry.
    /// Signals a directory or configuration defect, never resolved by
    /// silently picking one entry.
    #[error("username matched {count} directory entries, expected at most one")]
    AmbiguousMatch {
        /// Number of directory entries the search matched.
        count: usize,
    },

    /// Role resolution was requested but no `role` section is
    /// configured and `client.skip_roles` is not set.
    #[error(
        "no `role` configuration; set `skip_roles` under the `client` key to tolerate this"
    )]
    RoleConfigMissing,

    /// The group-membership graph exceeded the recursion depth guard.
    /// Partial results are discarded.
    #[error("group membership recursion is too deep")]
    RecursionTooDeep,

    /// Internal misuse of the crate, e.g. a service bind user
    /// configured without a password.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),

    /// Transport or protocol failure reported by the directory.
    #[error("directory operation failed: {0}")]
    Directory(#[from] ldap3::LdapError),

    /// The configuration file could not be opened.
    #[error("cannot read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The configuration file is not valid YAML for [`crate::Parameters`].
    #[error("cannot parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}
