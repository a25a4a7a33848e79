//! Attribute-level, role-hierarchical access control.
//!
//! This crate provides a declarative grant table with single-parent role
//! inheritance, an own/any-scoped permission resolver, and a field filter
//! that projects document-store records down to the fields a caller may
//! see or set. The default behavior is deny-by-default: a role with no
//! matching grant resolves to a denied [`Permission`]. Object ids nested
//! anywhere in a filtered record are normalized to their canonical
//! lowercase hex form on the way out.
//!
//! # Examples
//!
//! Resolving against a custom grant table:
//! ```
//! use rs_grants::{Action, Grants, ResourceName, RoleId, Scope};
//!
//! let grants = Grants::builder()
//!     .grant("reader", "notes", "read", &["id", "title"])
//!     .grant("editor", "notes", "update", &["*", "!locked"])
//!     .extend_role("editor", "reader")
//!     .build()?;
//!
//! let editor = [RoleId::try_from("editor")?];
//! let notes = ResourceName::try_from("notes")?;
//! assert!(grants.is_allowed(&editor, Action::Read, &notes, Scope::Any)?);
//! # Ok::<(), rs_grants::Error>(())
//! ```
//!
//! Filtering a raw record through a resolved permission:
//! ```
//! use bson::{bson, doc, oid::ObjectId};
//! use rs_grants::{Action, ResourceName, RoleId, Scope, default_grants};
//!
//! let public = [RoleId::try_from(rs_grants::PUBLIC)?];
//! let users = ResourceName::try_from(rs_grants::USERS)?;
//! let permission = default_grants().resolve(&public, Action::Read, &users, Scope::Any)?;
//!
//! let id = ObjectId::new();
//! let record = doc! {"id": id, "name": "Al", "email": "al@example.com"};
//! let filtered = permission.filter(record.into());
//! assert_eq!(filtered, bson!({"id": id.to_hex(), "name": "Al"}));
//! # Ok::<(), rs_grants::Error>(())
//! ```
#![forbid(unsafe_code)]

mod defaults;
mod error;
mod filter;
mod grants;
mod permission;
mod rule;
mod types;

pub use crate::defaults::{ADMIN, MESSAGES, PUBLIC, USER, USERS, USER_ADMIN, default_grants};
pub use crate::error::{Error, Result};
pub use crate::filter::{canonical_id, canonical_id_str, normalize_ids};
pub use crate::grants::{Grants, GrantsBuilder};
pub use crate::permission::Permission;
pub use crate::rule::FieldRule;
pub use crate::types::{Action, Principal, PrincipalId, ResourceName, RoleId, Scope};
