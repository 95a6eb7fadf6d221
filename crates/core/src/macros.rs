//! Declarative helpers for status enums persisted as TEXT columns.

/// Define a closed enum whose variants map one-to-one onto database strings.
///
/// Generates `ALL`, `as_str`, `from_str_db`, `FromStr`, serde (de)serialization
/// using the database strings, and `Display`.
macro_rules! define_string_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $val)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Convert to the string stored in the database.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }

            /// Parse the string stored in the database.
            pub fn from_str_db(s: &str) -> Result<Self, $crate::error::CoreError> {
                s.parse()
            }
        }

        /// Request input goes through `str::parse`; rejections are
        /// `CoreError::Validation` naming the accepted values.
        impl std::str::FromStr for $name {
            type Err = $crate::error::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $val => Ok($name::$variant), )+
                    _ => Err($crate::error::CoreError::Validation(format!(
                        "Invalid {} '{s}'. Must be one of: {}",
                        $label,
                        [$( $val ),+].join(", ")
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
