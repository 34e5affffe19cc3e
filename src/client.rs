//! Directory client capability consumed by the resolvers.

use std::collections::HashMap;

use crate::config::Parameters;
use crate::error::Result;

/// One entry returned by a directory search.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute values, each attribute multi-valued and ordered.
    pub attributes: HashMap<String, Vec<String>>,
}

impl Entry {
    /// First value of the given attribute, if present.
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .get(attribute)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Search and bind operations against a directory.
///
/// The resolvers are generic over this trait; production code uses the
/// `ldap3`-backed [`crate::Ldap`], tests use an in-memory stub.
#[allow(async_fn_in_trait)]
pub trait DirectoryClient {
    /// Active configuration. Read-only to the core.
    fn parameters(&self) -> &Parameters;

    /// Neutralize filter metacharacters in a raw value.
    ///
    /// Every username or member key MUST pass through here before
    /// being interpolated into a generated filter.
    fn escape(&self, raw: &str) -> String {
        escape_filter(raw)
    }

    /// Subtree search under `base_dn`. `attributes = None` requests
    /// everything.
    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
        attributes: Option<&[String]>,
    ) -> Result<Vec<Entry>>;

    /// Attempt to authenticate as `identity`. `Ok(false)` means the
    /// directory declined the credential; transport failures are `Err`.
    async fn bind(&mut self, identity: &str, password: &str) -> Result<bool>;
}

/// Hex-escape LDAP filter metacharacters.
pub fn escape_filter(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.as_bytes() {
        match *b {
            b'*' => out.push_str(r"\2a"),
            b'(' => out.push_str(r"\28"),
            b')' => out.push_str(r"\29"),
            b'\\' => out.push_str(r"\5c"),
            0 => out.push_str(r"\00"),
            c => out.push(c as char),
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use crate::config::{
        ClientParameters, Connection, Parameters, RoleParameters,
        UserIdField, UserParameters,
    };

    /// In-memory directory keyed by the exact generated filter.
    pub(crate) struct StubDirectory {
        params: Parameters,
        entries: HashMap<String, Vec<Entry>>,
        accepted: Vec<(String, String)>,
        /// `(base_dn, filter)` of every search issued.
        pub searches: Vec<(String, String)>,
        /// Identity of every bind issued.
        pub binds: Vec<String>,
    }

    impl StubDirectory {
        pub fn new(params: Parameters) -> Self {
            Self {
                params,
                entries: HashMap::new(),
                accepted: Vec::new(),
                searches: Vec::new(),
                binds: Vec::new(),
            }
        }

        pub fn entry(
            mut self,
            filter: &str,
            dn: &str,
            attributes: &[(&str, &[&str])],
        ) -> Self {
            let entry = Entry {
                dn: dn.to_owned(),
                attributes: attributes
                    .iter()
                    .map(|(name, values)| {
                        (
                            (*name).to_owned(),
                            values.iter().map(|v| (*v).to_owned()).collect(),
                        )
                    })
                    .collect(),
            };
            self.entries.entry(filter.to_owned()).or_default().push(entry);
            self
        }

        pub fn accept(mut self, identity: &str, password: &str) -> Self {
            self.accepted.push((identity.to_owned(), password.to_owned()));
            self
        }
    }

    impl DirectoryClient for StubDirectory {
        fn parameters(&self) -> &Parameters {
            &self.params
        }

        async fn search(
            &mut self,
            base_dn: &str,
            filter: &str,
            _attributes: Option<&[String]>,
        ) -> Result<Vec<Entry>> {
            self.searches.push((base_dn.to_owned(), filter.to_owned()));
            Ok(self.entries.get(filter).cloned().unwrap_or_default())
        }

        async fn bind(
            &mut self,
            identity: &str,
            password: &str,
        ) -> Result<bool> {
            self.binds.push(identity.to_owned());
            Ok(self
                .accepted
                .iter()
                .any(|(i, p)| i == identity && p == password))
        }
    }

    /// Baseline parameters shared by resolver tests.
    pub(crate) fn parameters() -> Parameters {
        Parameters {
            connection: Connection {
                address: "ldap://localhost:2389".to_owned(),
                user: None,
                password: None,
            },
            user: UserParameters {
                base_dn: "ou=people,dc=example".to_owned(),
                filter: None,
                name_attribute: "uid".to_owned(),
                attributes: vec!["cn".to_owned(), "mail".to_owned()],
            },
            role: Some(RoleParameters {
                base_dn: "ou=groups,dc=example".to_owned(),
                filter: None,
                user_attribute: "member".to_owned(),
                name_attribute: "cn".to_owned(),
                user_id: UserIdField::Dn,
                recursive_search: false,
            }),
            client: ClientParameters::default(),
        }
    }
}
