//! Group-membership resolution into canonical role tokens.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::client::{DirectoryClient, Entry};
use crate::config::UserIdField;
use crate::error::{Error, Result};

/// Deepest nested-group chain the walk will follow. A key reaching
/// this depth aborts the whole resolution; a cyclic membership graph
/// would otherwise never terminate.
const MAX_DEPTH: usize = 10;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").unwrap());

/// Turn a group display name into a canonical token: runs of non-word
/// characters collapse to one `_`, outer `_` are trimmed, the rest is
/// upper-cased. `"Site Admins!!"` becomes `SITE_ADMINS`.
pub fn slugify(name: &str) -> String {
    NON_WORD
        .replace_all(name, "_")
        .trim_matches('_')
        .to_uppercase()
}

/// Resolve every role token reachable from `key`, the identifying
/// value matched against the configured `user_attribute`.
///
/// The walk is an explicit depth-first worklist: each level searches
/// `role.base_dn` for entries naming the current key as a member,
/// contributes `ROLE_<slug>` per match, and, with `recursive_search`,
/// queues each match's own key one level deeper. The result is a set
/// union; how many paths reach a role does not matter.
///
/// Requires the `role` section; callers tolerate its absence (or not)
/// before getting here.
pub async fn resolve_roles<C: DirectoryClient>(
    client: &mut C,
    key: &str,
) -> Result<BTreeSet<String>> {
    let params = client
        .parameters()
        .role
        .clone()
        .ok_or(Error::RoleConfigMissing)?;
    let wanted =
        [params.name_attribute.clone(), params.user_id.as_str().to_owned()];

    let mut roles = BTreeSet::new();
    let mut pending = vec![(key.to_owned(), 0usize)];

    while let Some((key, depth)) = pending.pop() {
        if depth >= MAX_DEPTH {
            tracing::error!(
                depth,
                "group membership graph is too deep, aborting resolution"
            );
            return Err(Error::RecursionTooDeep);
        }

        let filter = format!(
            "(&{}({}={}))",
            params.filter.as_deref().unwrap_or(""),
            params.user_attribute,
            client.escape(&key),
        );

        let entries =
            client.search(&params.base_dn, &filter, Some(&wanted)).await?;
        for entry in entries {
            match entry.first(&params.name_attribute) {
                Some(name) => {
                    roles.insert(format!("ROLE_{}", slugify(name)));
                },
                None => tracing::warn!(
                    dn = %entry.dn,
                    attribute = %params.name_attribute,
                    "role entry has no name attribute"
                ),
            }

            if params.recursive_search {
                match member_key(params.user_id, &entry) {
                    Some(next) => pending.push((next, depth + 1)),
                    None => tracing::warn!(
                        dn = %entry.dn,
                        "role entry has no usable member key"
                    ),
                }
            }
        }
    }

    Ok(roles)
}

/// Identifying key a matched role entry contributes when recursing.
fn member_key(field: UserIdField, entry: &Entry) -> Option<String> {
    match field {
        UserIdField::Dn => Some(entry.dn.clone()),
        UserIdField::Username => {
            entry.first(field.as_str()).map(str::to_owned)
        },
    }
}
