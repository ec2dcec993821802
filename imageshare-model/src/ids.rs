use std::{fmt, str::FromStr};

use uuid::Uuid;

use crate::error::ModelError;

/// Declares a strongly typed UUID v7 identifier.
///
/// Every entity id shares the same surface: `new()` mints a time-ordered id,
/// `as_uuid`/`to_uuid` expose the raw value for persistence, and `FromStr`
/// accepts the hyphenated form used in URLs.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_str(&self) -> String {
                self.0.to_string()
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::InvalidId(format!(
                        "{} ID cannot be empty",
                        $label
                    )));
                }
                Uuid::parse_str(trimmed).map(Self).map_err(|err| {
                    ModelError::InvalidId(format!("invalid {} ID '{}': {}", $label, trimmed, err))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Strongly typed ID for user accounts
    UserID,
    "user"
);
entity_id!(
    /// Strongly typed ID for uploaded images
    ImageID,
    "image"
);
entity_id!(
    /// Strongly typed ID for albums
    AlbumID,
    "album"
);
entity_id!(
    /// Strongly typed ID for share grants
    ShareID,
    "share"
);
entity_id!(
    /// Strongly typed ID for comments
    CommentID,
    "comment"
);
