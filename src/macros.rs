//! Macros for declaring node keys.

/// Declare a fieldless key enum and implement [`NodeKey`](crate::node::NodeKey)
/// for it. Each key's name is its variant name.
///
/// # Example
///
/// ```
/// use waymark::node::NodeKey;
/// use waymark::node_keys;
///
/// node_keys! {
///     pub enum Key {
///         Root,
///         Title,
///         Home,
///     }
/// }
///
/// assert_eq!(Key::Home.name(), "Home");
/// ```
#[macro_export]
macro_rules! node_keys {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::node::NodeKey for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
