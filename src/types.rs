use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

const MAX_NAME_LEN: usize = 128;

fn validate_simple_name(value: &str, kind: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidId(format!("{kind} must not be empty")));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(Error::InvalidId(format!(
            "{kind} length must be <= {MAX_NAME_LEN}"
        )));
    }
    if !trimmed.chars().all(is_allowed_name_char) {
        return Err(Error::InvalidId(format!(
            "{kind} contains invalid characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn is_allowed_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, ':' | '_' | '-')
}

macro_rules! define_id_type {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            pub fn new(value: impl AsRef<str>) -> Result<Self> {
                validate_simple_name(value.as_ref(), $kind).map(Self)
            }

            /// Creates an identifier from a trusted string without validation.
            pub fn from_string(value: String) -> Self {
                Self(value)
            }

            /// Returns the underlying string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::from_string(value)
            }
        }
    };
}

define_id_type!(
    /// Role identifier.
    RoleId,
    "role id"
);
define_id_type!(
    /// Principal identifier, the canonical string form of a record id.
    PrincipalId,
    "principal id"
);
define_id_type!(
    /// Resource name owning a namespace of grantable actions.
    ResourceName,
    "resource name"
);

/// Action on a resource.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Action {
    /// Create a new resource instance.
    Create,
    /// Read resource instances.
    Read,
    /// Modify an existing resource instance.
    Update,
    /// Remove a resource instance.
    Delete,
}

impl Action {
    /// Returns the lowercase keyword for this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(Error::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a grant applies to resources owned by the caller or to any
/// resource of the type. Own and any are independent grants; neither
/// implies the other.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Scope {
    /// The caller owns the resource instance.
    Own,
    /// Any resource instance.
    #[default]
    Any,
}

impl Scope {
    /// Returns the lowercase keyword for this scope.
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Own => "own",
            Scope::Any => "any",
        }
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "own" => Ok(Scope::Own),
            "any" => Ok(Scope::Any),
            other => Err(Error::InvalidScope(other.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller context supplied by the authentication layer.
///
/// Holds the set of roles the caller carries and, for authenticated
/// callers, the canonical string form of their record id.
#[derive(Clone, Debug)]
pub struct Principal {
    roles: Vec<RoleId>,
    id: Option<PrincipalId>,
}

impl Principal {
    /// Creates a principal from a role set and an optional identity.
    pub fn new(roles: Vec<RoleId>, id: Option<PrincipalId>) -> Self {
        Self { roles, id }
    }

    /// Creates the unauthenticated principal: the public role, no identity.
    pub fn anonymous() -> Self {
        Self {
            roles: vec![RoleId::from_string(crate::defaults::PUBLIC.to_string())],
            id: None,
        }
    }

    /// Returns the roles this principal holds.
    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }

    /// Returns the identity, if authenticated.
    pub fn id(&self) -> Option<&PrincipalId> {
        self.id.as_ref()
    }

    /// Returns whether the given record id value belongs to this principal.
    ///
    /// Both sides are compared in canonical string form, so a raw object id
    /// on the record side matches the hex string the authentication layer
    /// supplies. Anonymous principals own nothing.
    pub fn owns(&self, id_value: &bson::Bson) -> bool {
        let Some(id) = &self.id else {
            return false;
        };
        match crate::filter::canonical_id(id_value) {
            Some(canonical) => canonical == crate::filter::canonical_id_str(id.as_str()),
            None => false,
        }
    }
}
