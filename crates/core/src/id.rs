//! Aggregate identities and their canonical cross-system form.

use core::fmt::Debug;
use core::hash::Hash;

use thiserror::Error;
use uuid::Uuid;

/// An opaque value naming one aggregate instance within its bounded context.
///
/// `canonical` is the form other systems see (logs, storage keys, error
/// messages). It must be a pure function of the value.
pub trait Identity: Clone + Eq + Hash + Debug + 'static {
    fn canonical(&self) -> String;
}

impl Identity for Uuid {
    fn canonical(&self) -> String {
        self.hyphenated().to_string()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
}

impl IdentityError {
    pub fn invalid(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            reason: reason.into(),
        }
    }
}

/// Normalize a raw string identity: trimmed, non-empty, no inner whitespace,
/// upper-cased.
pub fn normalize_upper(kind: &'static str, raw: &str) -> Result<String, IdentityError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::invalid(kind, "cannot be empty"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(IdentityError::invalid(
            kind,
            format!("'{trimmed}' contains whitespace"),
        ));
    }
    Ok(trimmed.to_uppercase())
}

/// Declare a string-backed identity whose canonical form is upper case.
///
/// ```ignore
/// tellask_core::string_identity!(ItemId, "ItemId");
/// let id = ItemId::parse("33dd1a")?;
/// assert_eq!(id.canonical(), "33DD1A");
/// ```
#[macro_export]
macro_rules! string_identity {
    ($t:ident, $name:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $t(String);

        impl $t {
            pub fn parse(raw: &str) -> Result<Self, $crate::id::IdentityError> {
                $crate::id::normalize_upper($name, raw).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl $crate::id::Identity for $t {
            fn canonical(&self) -> String {
                self.0.clone()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl core::str::FromStr for $t {
            type Err = $crate::id::IdentityError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl $crate::__private::serde::Serialize for $t {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                let raw = <String as $crate::__private::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                Self::parse(&raw).map_err(<D::Error as $crate::__private::serde::de::Error>::custom)
            }
        }
    };
}
