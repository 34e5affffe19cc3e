//! ldauth resolves usernames into verified, role-annotated identities
//! against an LDAP-compatible directory.
//!
//! The crate is the authentication core of an application that
//! delegates identity management to a directory instead of owning a
//! user store: one search locates the entry matching a username, a
//! bounded walk over group memberships derives canonical role tokens
//! such as `ROLE_SITE_ADMINS`, and a bind verifies the claimed
//! password. Two strategies are supported: search-then-bind
//! ([`Authenticator::authenticate`]) for deployments whose search
//! connection may read user and role entries, and bind-then-search
//! ([`Authenticator::authenticate_no_anonymous_search`]) for those
//! that must authenticate before any lookup.
//!
//! ```no_run
//! # async fn run() -> ldauth::Result<()> {
//! use std::sync::Arc;
//!
//! use ldauth::{Authenticator, Ldap, Parameters};
//!
//! let params = Arc::new(Parameters::read("config.yaml")?);
//! let mut auth = Authenticator::new(Ldap::connect(params).await?);
//!
//! if let Some(user) = auth.authenticate("alice", "s3cret").await? {
//!     println!("{} has roles {:?}", user.dn(), user.roles());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs, unused_mut)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
mod ldap;
pub mod roles;
pub mod user;

pub use auth::{Authenticator, RoleOutcome};
pub use client::{DirectoryClient, Entry, escape_filter};
pub use config::{Parameters, UserIdField};
pub use error::{Error, Result};
pub use ldap::Ldap;
pub use user::DirectoryUser;
