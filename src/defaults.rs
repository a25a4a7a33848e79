//! Stock policy for the users/messages backend.
//!
//! Role and resource names plus the grant table the resource services run
//! against. The table is declared once and memoized on first use; the
//! engine in [`crate::grants`] stays generic over any declaration.

use crate::grants::{Grants, GrantsBuilder};
use std::sync::OnceLock;

/// Role of unauthenticated callers.
pub const PUBLIC: &str = "public";
/// Role of regular authenticated users.
pub const USER: &str = "user";
/// Role allowed to manage user records.
pub const USER_ADMIN: &str = "userAdmin";
/// Top role; the only one allowed to assign roles.
pub const ADMIN: &str = "admin";

/// Resource name of user records.
pub const USERS: &str = "users";
/// Resource name of message records.
pub const MESSAGES: &str = "messages";

static GRANTS: OnceLock<Grants> = OnceLock::new();

/// Returns the stock grant table, building it on first use.
///
/// Thread-safe: concurrent first callers observe exactly one fully built
/// table.
pub fn default_grants() -> &'static Grants {
    GRANTS.get_or_init(|| {
        declare()
            .build()
            .expect("stock grant declaration is well-formed")
    })
}

fn declare() -> GrantsBuilder {
    Grants::builder()
        .grant(PUBLIC, USERS, "read", &["id", "name"])
        .grant(
            USER,
            USERS,
            "read:own",
            &["id", "created", "email", "name", "facebook", "google"],
        )
        .grant(USER, USERS, "update:own", &["name"])
        .grant(USER, USERS, "delete:own", &["*"])
        .grant(USER, MESSAGES, "create", &["to", "title", "message"])
        .grant(USER, MESSAGES, "read:own", &["*"])
        .grant(USER, MESSAGES, "delete:own", &["*"])
        .grant(USER_ADMIN, USERS, "create", &["*", "!roles"])
        .grant(USER_ADMIN, USERS, "read", &["*"])
        .grant(USER_ADMIN, USERS, "update", &["*", "!roles"])
        .grant(USER_ADMIN, USERS, "delete", &["*"])
        .grant(ADMIN, USERS, "create", &["*"])
        .grant(ADMIN, USERS, "update", &["*"])
        .extend_role(USER, PUBLIC)
        .extend_role(USER_ADMIN, USER)
        .extend_role(ADMIN, USER_ADMIN)
}
