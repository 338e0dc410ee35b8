//! Node keys.
//!
//! Every node in the navigation tree is addressed by a key. Keys are plain
//! values, usually a fieldless enum generated with [`node_keys!`](crate::node_keys).

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Identifier for a node in the navigation tree.
///
/// Keys must be cheap to clone and hashable; they are used as registry keys,
/// router history entries and checkpoint payloads.
///
/// # Example
///
/// ```rust
/// use waymark::node::NodeKey;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Screen {
///     Title,
///     Home,
///     Party,
/// }
///
/// impl NodeKey for Screen {
///     fn name(&self) -> &str {
///         match self {
///             Self::Title => "Title",
///             Self::Home => "Home",
///             Self::Party => "Party",
///         }
///     }
/// }
/// ```
pub trait NodeKey:
    Clone + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + 'static
{
    /// Display name used in logs and error messages.
    fn name(&self) -> &str;
}

impl NodeKey for String {
    fn name(&self) -> &str {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestKey {
        Root,
        Session,
        Screen,
    }

    impl NodeKey for TestKey {
        fn name(&self) -> &str {
            match self {
                Self::Root => "Root",
                Self::Session => "Session",
                Self::Screen => "Screen",
            }
        }
    }

    #[test]
    fn key_name_returns_correct_value() {
        assert_eq!(TestKey::Root.name(), "Root");
        assert_eq!(TestKey::Session.name(), "Session");
        assert_eq!(TestKey::Screen.name(), "Screen");
    }

    #[test]
    fn string_keys_name_themselves() {
        let key = "Home".to_string();
        assert_eq!(key.name(), "Home");
    }

    #[test]
    fn key_serializes_correctly() {
        let key = TestKey::Session;
        let json = serde_json::to_string(&key).unwrap();
        let deserialized: TestKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, deserialized);
    }
}
