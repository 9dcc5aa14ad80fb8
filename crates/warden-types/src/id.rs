//! Numeric identifiers
//!
//! All ids are 64-bit integers internally. They are rendered as decimal
//! strings when serialized so clients never round-trip them through a
//! floating point number. Deserialization accepts both forms.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ParseError;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub i64);

        impl $name {
            /// Parse an id from its decimal string form
            pub fn parse(s: &str) -> Result<Self, ParseError> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| ParseError::InvalidId(s.to_string()))
            }

            /// Raw integer value
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(IdVisitor).map(Self)
            }
        }
    };
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("an integer id or its decimal string form")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("id out of range: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        v.trim()
            .parse::<i64>()
            .map_err(|_| E::custom(format!("invalid id: {v}")))
    }
}

numeric_id!(
    /// Unique user identifier
    UserId
);

numeric_id!(
    /// Unique session identifier
    SessionId
);

numeric_id!(
    /// API key identifier
    ApiKeyId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_string() {
        let id = UserId(9_007_199_254_740_993);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"9007199254740993\"");
    }

    #[test]
    fn test_id_deserializes_from_string_or_number() {
        let from_str: UserId = serde_json::from_str("\"42\"").unwrap();
        let from_num: UserId = serde_json::from_str("42").unwrap();
        assert_eq!(from_str, UserId(42));
        assert_eq!(from_num, UserId(42));
    }

    #[test]
    fn test_id_rejects_garbage() {
        assert!(serde_json::from_str::<ApiKeyId>("\"abc\"").is_err());
        assert!(serde_json::from_str::<ApiKeyId>("18446744073709551615").is_err());
        assert_eq!(
            SessionId::parse("x1"),
            Err(ParseError::InvalidId("x1".to_string()))
        );
    }

    #[test]
    fn test_id_parse_roundtrip() {
        let id = ApiKeyId(i64::MAX);
        assert_eq!(ApiKeyId::parse(&id.to_string()).unwrap(), id);
    }
}
