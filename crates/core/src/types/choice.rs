//! Fixed-choice enums stored as short text codes.
//!
//! Catalog attributes, address types, and profile preferences are all small
//! closed sets persisted as `TEXT` codes. The `define_choice!` macro generates
//! the enum plus its code/label mapping, parsing, serde, and sqlx support.

use thiserror::Error;

/// Error returned when a string is not a known code for a choice enum.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind} code: {value:?}")]
pub struct ChoiceError {
    /// Name of the enum that rejected the value.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Macro to define a closed set of choices with stable storage codes.
///
/// Generates:
/// - The enum with `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `ALL`, `as_str()` (storage code), and `label()` (human-readable)
/// - `Display` (label) and `FromStr` (code)
/// - `Serialize`/`Deserialize` as the storage code
/// - `sqlx` `Type`, `Encode`, and `Decode` as `TEXT` (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use bookbazar_core::define_choice;
/// define_choice!(
///     /// Shelf position.
///     Shelf {
///         Top => ("T", "Top shelf"),
///         Bottom => ("B", "Bottom shelf"),
///     }
/// );
///
/// assert_eq!("T".parse::<Shelf>().unwrap(), Shelf::Top);
/// assert_eq!(Shelf::Bottom.label(), "Bottom shelf");
/// ```
#[macro_export]
macro_rules! define_choice {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => ($code:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            /// Every choice, in display order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

            /// Storage code for this choice.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $code ),+
                }
            }

            /// Human-readable label for this choice.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::choice::ChoiceError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                match s {
                    $( $code => Ok(Self::$variant), )+
                    _ => Err($crate::types::choice::ChoiceError {
                        kind: stringify!($name),
                        value: s.to_owned(),
                    }),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                let code = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                code.parse().map_err(::serde::de::Error::custom)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let code = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(code.parse::<Self>()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::core::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}
