//! Axum extractors that guard handlers behind a session.
use std::marker::PhantomData;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use folio_common::{PublicUser, Role};

use crate::error::AppError;
use crate::storage::UserStore;
use crate::AppState;

/// The authenticated caller. Rejects with 401 when there is no valid session.
#[derive(Debug, Clone)]
pub struct AuthUser(pub PublicUser);

impl<S> FromRequestParts<Arc<AppState<S>>> for AuthUser
where
    S: UserStore + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        state.auth.require_auth(&jar).await.map(AuthUser)
    }
}

/// Minimum role demanded by [`RequireRole`]
pub trait RoleGate: Send + Sync + 'static {
    const ROLE: Role;
}

/// Authors, editors and admins
pub struct Author;
/// Editors and admins
pub struct Editor;
/// Admins only
pub struct Admin;

impl RoleGate for Author {
    const ROLE: Role = Role::Author;
}

impl RoleGate for Editor {
    const ROLE: Role = Role::Editor;
}

impl RoleGate for Admin {
    const ROLE: Role = Role::Admin;
}

/// The authenticated caller, if their role is at least `R::ROLE`.
///
/// Rejects with 401 when anonymous and 403 when the role is too low.
pub struct RequireRole<R: RoleGate> {
    pub user: PublicUser,
    _gate: PhantomData<R>,
}

impl<R: RoleGate> RequireRole<R> {
    pub fn into_inner(self) -> PublicUser {
        self.user
    }
}

impl<S, R> FromRequestParts<Arc<AppState<S>>> for RequireRole<R>
where
    S: UserStore + 'static,
    R: RoleGate,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user = state.auth.require_role(&jar, R::ROLE).await?;
        Ok(Self {
            user,
            _gate: PhantomData,
        })
    }
}
