// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the Folio web client and server.
//! This module defines the JSON bodies of the auth API and supporting types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a user account.
///
/// Roles form an additive hierarchy: every role grants the permissions of
/// the roles declared before it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular reader; may comment and like
    #[default]
    User,
    /// May write posts
    Author,
    /// May edit and moderate other authors' posts
    Editor,
    /// Full access
    Admin,
}

impl Role {
    /// All roles, lowest first.
    pub const ALL: [Role; 4] = [Role::User, Role::Author, Role::Editor, Role::Admin];

    /// Whether this role grants at least the permissions of `required`.
    pub fn at_least(self, required: Role) -> bool {
        self >= required
    }

    /// Wire name of the role (`"USER"`, `"AUTHOR"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Author => "AUTHOR",
            Role::Editor => "EDITOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// User data that is safe to hand to clients (no password hash).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Body of `POST /api/auth/login`
///
/// Both fields default to empty so that a missing field is reported as a
/// bad request by the handler instead of a deserialization failure.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login: the public user plus the raw token for non-cookie clients.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Body of `POST /api/auth/register`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Derived from the email address when omitted
    #[serde(default)]
    pub username: Option<String>,
}

/// Wrapper used by `register` and `me`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserResponse {
    pub user: PublicUser,
}

/// Role predicates of the current caller
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub is_admin: bool,
    pub is_author: bool,
    pub is_editor: bool,
}

impl Permissions {
    /// Permissions granted by `role`; `None` means anonymous.
    pub fn for_role(role: Option<Role>) -> Self {
        let has = |required| role.is_some_and(|r| r.at_least(required));
        Self {
            is_admin: has(Role::Admin),
            is_author: has(Role::Author),
            is_editor: has(Role::Editor),
        }
    }
}

/// Body of `GET /api/dashboard/session`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DashboardSession {
    pub user: PublicUser,
    pub permissions: Permissions,
}

/// Plain acknowledgement, e.g. after logout
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}
