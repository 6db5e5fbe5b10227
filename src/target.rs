//! Shortcut targets: what a bound action applies to
//!
//! A target is one of: nothing (unbound), the current UI selection, a set of
//! users, or a channel. Targets are used as map/set keys by the shortcut
//! engine, so equality and hashing go through a single normalized projection
//! and the equal-implies-equal-hash law holds by construction.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// The set of entities a shortcut action applies to.
///
/// `Users` carries names (stable across reconnects) and session ids (valid
/// within one connection); either set may be empty. A `Users` target with
/// both sets empty is indistinguishable from `Unbound` for matching purposes
/// and compares equal to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShortcutTarget {
    #[default]
    Unbound,
    CurrentSelection,
    Users {
        #[serde(default)]
        names: BTreeSet<String>,
        #[serde(default)]
        sessions: BTreeSet<u32>,
    },
    Channel {
        id: i32,
        /// Restrict to members of this access group, if set
        #[serde(default)]
        group: Option<String>,
        #[serde(default)]
        include_links: bool,
        #[serde(default)]
        include_children: bool,
        #[serde(default)]
        force_center: bool,
    },
}

/// Normalized projection used for equality, hashing and ordering.
/// An empty `Users` target collapses to `Unbound` here.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
enum TargetKey<'a> {
    Unbound,
    CurrentSelection,
    Users(&'a BTreeSet<String>, &'a BTreeSet<u32>),
    Channel(i32, Option<&'a str>, bool, bool, bool),
}

impl ShortcutTarget {
    pub fn users<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::Users {
            names: names.into_iter().map(Into::into).collect(),
            sessions: BTreeSet::new(),
        }
    }

    pub fn sessions<I: IntoIterator<Item = u32>>(sessions: I) -> Self {
        Self::Users {
            names: BTreeSet::new(),
            sessions: sessions.into_iter().collect(),
        }
    }

    pub fn channel(id: i32) -> Self {
        Self::Channel {
            id,
            group: None,
            include_links: false,
            include_children: false,
            force_center: false,
        }
    }

    fn key(&self) -> TargetKey<'_> {
        match self {
            Self::Unbound => TargetKey::Unbound,
            Self::CurrentSelection => TargetKey::CurrentSelection,
            Self::Users { names, sessions } if names.is_empty() && sessions.is_empty() => {
                TargetKey::Unbound
            }
            Self::Users { names, sessions } => TargetKey::Users(names, sessions),
            Self::Channel {
                id,
                group,
                include_links,
                include_children,
                force_center,
            } => TargetKey::Channel(
                *id,
                group.as_deref(),
                *include_links,
                *include_children,
                *force_center,
            ),
        }
    }

    /// Whether this target names concrete entities that only exist within
    /// one server connection. Unbound and current-selection targets carry
    /// over between servers; user and channel targets do not.
    pub fn is_server_specific(&self) -> bool {
        matches!(self.key(), TargetKey::Users(..) | TargetKey::Channel(..))
    }

    pub fn is_unbound(&self) -> bool {
        self.key() == TargetKey::Unbound
    }
}

impl PartialEq for ShortcutTarget {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ShortcutTarget {}

impl Hash for ShortcutTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for ShortcutTarget {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for ShortcutTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(target: &ShortcutTarget) -> u64 {
        let mut hasher = DefaultHasher::new();
        target.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_default_equals_empty_users() {
        let unbound = ShortcutTarget::default();
        let empty_users = ShortcutTarget::users(Vec::<String>::new());

        assert_eq!(unbound, empty_users);
        assert_eq!(hash_of(&unbound), hash_of(&empty_users));
        assert!(!unbound.is_server_specific());
        assert!(!empty_users.is_server_specific());
        assert!(empty_users.is_unbound());
    }

    #[test]
    fn test_user_set_equality_ignores_insertion_order() {
        let a = ShortcutTarget::users(["alice", "bob"]);
        let b = ShortcutTarget::users(["bob", "alice"]);

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_equal_implies_equal_hash() {
        let targets = [
            ShortcutTarget::Unbound,
            ShortcutTarget::CurrentSelection,
            ShortcutTarget::users(["alice"]),
            ShortcutTarget::sessions([7, 12]),
            ShortcutTarget::channel(3),
            ShortcutTarget::Channel {
                id: 3,
                group: Some("admin".to_string()),
                include_links: true,
                include_children: false,
                force_center: true,
            },
        ];

        for a in &targets {
            for b in &targets {
                if a == b {
                    assert_eq!(hash_of(a), hash_of(b));
                }
            }
        }
    }

    #[test]
    fn test_server_specific() {
        assert!(!ShortcutTarget::CurrentSelection.is_server_specific());
        assert!(ShortcutTarget::users(["alice"]).is_server_specific());
        assert!(ShortcutTarget::sessions([42]).is_server_specific());
        assert!(ShortcutTarget::channel(1).is_server_specific());
    }

    #[test]
    fn test_variants_are_distinct() {
        assert_ne!(ShortcutTarget::Unbound, ShortcutTarget::CurrentSelection);
        assert_ne!(ShortcutTarget::users(["alice"]), ShortcutTarget::channel(1));
        assert_ne!(ShortcutTarget::channel(1), ShortcutTarget::channel(2));
    }

    #[test]
    fn test_ordering_is_total_and_consistent() {
        let mut targets = vec![
            ShortcutTarget::channel(5),
            ShortcutTarget::CurrentSelection,
            ShortcutTarget::users(["zoe"]),
            ShortcutTarget::Unbound,
            ShortcutTarget::users(["alice"]),
        ];
        targets.sort();

        for pair in targets.windows(2) {
            assert!(pair[0] <= pair[1]);
            if pair[0] == pair[1] {
                assert_eq!(pair[0].cmp(&pair[1]), std::cmp::Ordering::Equal);
            }
        }
    }

    #[test]
    fn test_serde_roundtrip() {
        let target = ShortcutTarget::Channel {
            id: 9,
            group: Some("ops".to_string()),
            include_links: true,
            include_children: true,
            force_center: false,
        };

        let json = serde_json::to_string(&target).unwrap();
        let back: ShortcutTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(back, target);
    }
}
