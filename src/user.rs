//! Resolved directory identity and username lookup.

use std::collections::{BTreeSet, HashMap};

use crate::client::DirectoryClient;
use crate::error::{Error, Result};

/// Username rejected before any directory call.
const WILDCARD: &str = "*";

/// Attribute surfaced through [`DirectoryUser::email`].
const MAIL_ATTRIBUTE: &str = "mail";

/// A verified, role-annotated identity resolved from the directory.
///
/// Built by a single successful username lookup and never mutated
/// afterwards, except for the one-shot role attachment. Owned by the
/// authentication attempt that produced it; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryUser {
    username: String,
    dn: String,
    attributes: HashMap<String, String>,
    roles: Option<BTreeSet<String>>,
}

impl DirectoryUser {
    /// Original username supplied by the caller.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Distinguished name of the resolved entry.
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// First values of the configured attributes present on the entry.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// First value of one configured attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The `mail` attribute if configured and present, else empty.
    pub fn email(&self) -> &str {
        self.attribute(MAIL_ATTRIBUTE).unwrap_or("")
    }

    /// Canonical role tokens. `None` until role resolution ran;
    /// an empty set means it ran and found nothing.
    pub fn roles(&self) -> Option<&BTreeSet<String>> {
        self.roles.as_ref()
    }

    /// Whether the identity carries the given role token.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .as_ref()
            .is_some_and(|roles| roles.contains(role))
    }

    pub(crate) fn set_roles(&mut self, roles: BTreeSet<String>) {
        self.roles = Some(roles);
    }
}

/// Fail fast on the wildcard username, independent of the directory.
pub(crate) fn reject_wildcard(username: &str) -> Result<()> {
    if username == WILDCARD {
        return Err(Error::InvalidUsername);
    }
    Ok(())
}

/// Locate at most one directory entry matching `username`.
///
/// `Ok(None)` is the normal "no such user" outcome. More than one
/// match is [`Error::AmbiguousMatch`]; the search can only return a
/// single user.
pub async fn resolve_user<C: DirectoryClient>(
    client: &mut C,
    username: &str,
) -> Result<Option<DirectoryUser>> {
    reject_wildcard(username)?;

    let params = client.parameters().user.clone();
    let filter = format!(
        "(&{}({}={}))",
        params.filter.as_deref().unwrap_or(""),
        params.name_attribute,
        client.escape(username),
    );

    let entries = client.search(&params.base_dn, &filter, None).await?;
    let entry = match entries.as_slice() {
        [] => {
            tracing::debug!(username, "no matching directory entry");
            return Ok(None);
        },
        [entry] => entry,
        _ => {
            tracing::error!(
                username,
                count = entries.len(),
                "username search matched several entries"
            );
            return Err(Error::AmbiguousMatch { count: entries.len() });
        },
    };

    let attributes = params
        .attributes
        .iter()
        .filter_map(|name| {
            entry.first(name).map(|value| (name.clone(), value.to_owned()))
        })
        .collect();

    Ok(Some(DirectoryUser {
        username: username.to_owned(),
        dn: entry.dn.clone(),
        attributes,
        roles: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stub::{StubDirectory, parameters};

    #[tokio::test]
    async fn wildcard_never_reaches_the_directory() {
        let mut directory = StubDirectory::new(parameters());

        let result = resolve_user(&mut directory, "*").await;
        assert!(matches!(result, Err(Error::InvalidUsername)));
        assert!(directory.searches.is_empty());
    }

    #[tokio::test]
    async fn zero_matches_is_not_found() {
        let mut directory = StubDirectory::new(parameters());

        let user = resolve_user(&mut directory, "nobody").await.unwrap();
        assert_eq!(user, None);
        assert_eq!(
            directory.searches,
            vec![(
                "ou=people,dc=example".to_owned(),
                "(&(uid=nobody))".to_owned()
            )],
        );
    }

    #[tokio::test]
    async fn single_match_populates_configured_attributes() {
        let mut directory = StubDirectory::new(parameters()).entry(
            "(&(uid=alice))",
            "cn=alice,ou=people,dc=example",
            &[
                ("cn", &["Alice Example"]),
                ("mail", &["alice@example.org", "old@example.org"]),
                ("telephoneNumber", &["555-0100"]),
            ],
        );

        let user = resolve_user(&mut directory, "alice")
            .await
            .unwrap()
            .expect("user found");

        assert_eq!(user.username(), "alice");
        assert_eq!(user.dn(), "cn=alice,ou=people,dc=example");
        assert_eq!(user.attribute("cn"), Some("Alice Example"));
        // first value only.
        assert_eq!(user.email(), "alice@example.org");
        // not in the configured attribute list.
        assert_eq!(user.attribute("telephoneNumber"), None);
        assert_eq!(user.roles(), None);
    }

    #[tokio::test]
    async fn several_matches_are_ambiguous() {
        let mut directory = StubDirectory::new(parameters())
            .entry("(&(uid=alice))", "cn=alice,ou=people,dc=example", &[])
            .entry("(&(uid=alice))", "cn=alice,ou=service,dc=example", &[]);

        let result = resolve_user(&mut directory, "alice").await;
        assert!(matches!(result, Err(Error::AmbiguousMatch { count: 2 })));
    }

    #[tokio::test]
    async fn configured_filter_is_anded_in() {
        let mut params = parameters();
        params.user.filter = Some("(objectClass=person)".to_owned());
        let mut directory = StubDirectory::new(params);

        resolve_user(&mut directory, "alice").await.unwrap();
        assert_eq!(
            directory.searches[0].1,
            "(&(objectClass=person)(uid=alice))",
        );
    }

    #[tokio::test]
    async fn username_is_escaped_before_interpolation() {
        let mut directory = StubDirectory::new(parameters());

        resolve_user(&mut directory, "ali*ce)(uid=admin").await.unwrap();
        assert_eq!(
            directory.searches[0].1,
            r"(&(uid=ali\2ace\29\28uid=admin))",
        );
    }

    #[tokio::test]
    async fn missing_email_attribute_is_empty() {
        let mut directory = StubDirectory::new(parameters()).entry(
            "(&(uid=bob))",
            "cn=bob,ou=people,dc=example",
            &[("cn", &["Bob"])],
        );

        let user = resolve_user(&mut directory, "bob")
            .await
            .unwrap()
            .expect("user found");
        assert_eq!(user.email(), "");
    }
}
