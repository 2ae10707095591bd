//! Macro for declaring prefixed, ULID-backed identifier types.

/// Declares a typed identifier with a fixed string prefix.
///
/// The generated newtype wraps a ULID and provides:
/// - a `PREFIX` constant
/// - `new()` for a fresh id
/// - `parse()` plus `FromStr`, accepting only `{prefix}_{ulid}`
/// - `Display`, and serde support through the same string form
///
/// ```ignore
/// define_id!(WorkerId, "wkr");
///
/// let worker = WorkerId::new();
/// let parsed: WorkerId = worker.to_string().parse()?;
/// assert_eq!(worker, parsed);
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($crate::Ulid);

        impl $name {
            /// The string prefix of this id type.
            pub const PREFIX: &'static str = $prefix;

            /// Generates a fresh id.
            #[must_use]
            pub fn new() -> Self {
                Self($crate::Ulid::new())
            }

            /// Parses `{prefix}_{ulid}`.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                if s.is_empty() {
                    return Err($crate::IdError::Empty);
                }

                let ulid_str = match s
                    .strip_prefix(Self::PREFIX)
                    .and_then(|rest| rest.strip_prefix('_'))
                {
                    Some(rest) => rest,
                    None => {
                        let (prefix, _) = s
                            .split_once('_')
                            .ok_or($crate::IdError::MissingSeparator)?;
                        return Err($crate::IdError::InvalidPrefix {
                            expected: Self::PREFIX,
                            actual: prefix.to_string(),
                        });
                    }
                };

                ulid_str
                    .parse::<$crate::Ulid>()
                    .map(Self)
                    .map_err(|e| $crate::IdError::InvalidUlid(e.to_string()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}
