// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod cookie;
pub mod extract;
pub mod password;
pub mod token;
mod service;

pub use cookie::{expired_session_cookie, session_cookie, session_token, AUTH_COOKIE_NAME};
pub use extract::{Admin, AuthUser, Author, Editor, RequireRole, RoleGate};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordRequirements};
pub use service::AuthService;
pub use token::{Claims, TokenSigner, UserClaims, SESSION_TTL};
