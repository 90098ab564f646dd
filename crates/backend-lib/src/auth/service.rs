// ============================
// crates/backend-lib/src/auth/service.rs
// ============================
//! Login, logout, registration and session lookup.
use ::metrics::counter;
use axum_extra::extract::cookie::CookieJar;
use folio_common::{LoginResponse, Permissions, PublicUser, RegisterRequest, Role};
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

use super::cookie::{expired_session_cookie, session_cookie, session_token};
use super::password::{
    hash_password, verify_against_dummy, verify_password, PasswordRequirements,
};
use super::token::{Claims, TokenSigner, UserClaims};
use crate::config::Settings;
use crate::error::AppError;
use crate::metrics as keys;
use crate::storage::{NewUser, StorageError, UserStore};
use crate::validation::{
    normalize_email, username_from_email, validate_email, validate_name, validate_password,
    validate_username,
};

/// Upper bound on numeric suffixes tried when deriving a username
const MAX_USERNAME_ATTEMPTS: u32 = 100;

/// Authentication and session service.
///
/// Sessions are stateless: a signed token in the `auth_token` cookie is the
/// only record of a login. The user store is consulted on login and on
/// every identity lookup.
pub struct AuthService<S> {
    store: S,
    signer: TokenSigner,
    secure_cookies: bool,
    password_requirements: PasswordRequirements,
}

impl<S: UserStore> AuthService<S> {
    /// Create the service. Fails if the signing secret is missing or weak.
    pub fn new(store: S, settings: &Settings) -> Result<Self, AppError> {
        Ok(Self {
            store,
            signer: TokenSigner::from_settings(settings)?,
            secure_cookies: settings.secure_cookies(),
            password_requirements: settings.password_requirements.clone(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Hash a password off the async runtime.
    pub async fn hash_password(&self, plain: &str) -> Result<String, AppError> {
        let plain = Zeroizing::new(plain.to_owned());
        tokio::task::spawn_blocking(move || hash_password(&plain))
            .await?
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Verify a password off the async runtime. Never errors.
    pub async fn verify_password(&self, plain: &str, hash: &str) -> bool {
        let plain = Zeroizing::new(plain.to_owned());
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_password(&hash, &plain))
            .await
            .unwrap_or(false)
    }

    /// Sign a session token for `claims`.
    pub fn issue_token(&self, claims: &UserClaims) -> Result<String, AppError> {
        self.signer.issue(claims)
    }

    /// Validate a session token; every failure is `None`.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        self.signer.verify(token)
    }

    /// Authenticate `email`/`password` and start a session.
    ///
    /// On success the session cookie is added to the returned jar. On
    /// failure no jar is returned, so no cookie can be set.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        jar: CookieJar,
        email: &str,
        password: &str,
    ) -> Result<(CookieJar, LoginResponse), AppError> {
        let email = normalize_email(email);

        let user = match self.store.find_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                let plain = Zeroizing::new(password.to_owned());
                tokio::task::spawn_blocking(move || verify_against_dummy(&plain))
                    .await?;
                counter!(keys::LOGIN_FAILURE).increment(1);
                debug!("login for unknown email");
                return Err(AppError::CredentialNotFound);
            },
            Err(e) => {
                warn!(error = %e, "user store unavailable during login");
                return Err(AppError::ServiceUnavailable(e.to_string()));
            },
        };

        if !self.verify_password(password, &user.password_hash).await {
            counter!(keys::LOGIN_FAILURE).increment(1);
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AppError::InvalidCredential);
        }

        let token = self.issue_token(&UserClaims::from(&user))?;
        let jar = jar.add(session_cookie(token.clone(), self.secure_cookies));

        counter!(keys::LOGIN_SUCCESS).increment(1);
        info!(user_id = %user.id, role = %user.role, "user logged in");

        Ok((
            jar,
            LoginResponse {
                user: user.to_public(),
                token,
            },
        ))
    }

    /// End the session on the client by overwriting its cookie.
    ///
    /// Tokens are not revoked server-side: a copied token stays valid until
    /// it expires.
    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        counter!(keys::LOGOUT).increment(1);
        jar.add(expired_session_cookie(self.secure_cookies))
    }

    /// The user behind the session cookie, re-read from the store.
    ///
    /// Missing cookie, invalid token and deleted users are all `Ok(None)`;
    /// only a store outage is an error.
    pub async fn current_user(&self, jar: &CookieJar) -> Result<Option<PublicUser>, AppError> {
        let Some(token) = session_token(jar) else {
            return Ok(None);
        };
        let Some(claims) = self.verify_token(token) else {
            return Ok(None);
        };

        match self.store.find_by_id(&claims.id).await {
            Ok(Some(user)) => Ok(Some(user.to_public())),
            Ok(None) => {
                debug!(user_id = %claims.id, "session for deleted user");
                Ok(None)
            },
            Err(e) => {
                warn!(error = %e, "user store unavailable during session lookup");
                Err(AppError::ServiceUnavailable(e.to_string()))
            },
        }
    }

    /// Guard for protected operations.
    pub async fn require_auth(&self, jar: &CookieJar) -> Result<PublicUser, AppError> {
        self.current_user(jar)
            .await?
            .ok_or(AppError::AuthenticationRequired)
    }

    /// Guard for role-restricted operations: 401 when anonymous, 403 when
    /// the role is below `required`.
    pub async fn require_role(&self, jar: &CookieJar, required: Role) -> Result<PublicUser, AppError> {
        let user = self.require_auth(jar).await?;
        if user.role.at_least(required) {
            Ok(user)
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Role predicates of the current caller.
    pub async fn permissions(&self, jar: &CookieJar) -> Result<Permissions, AppError> {
        let role = self.current_user(jar).await?.map(|u| u.role);
        Ok(Permissions::for_role(role))
    }

    pub async fn is_admin(&self, jar: &CookieJar) -> Result<bool, AppError> {
        Ok(self.permissions(jar).await?.is_admin)
    }

    /// True for authors, editors and admins.
    pub async fn is_author(&self, jar: &CookieJar) -> Result<bool, AppError> {
        Ok(self.permissions(jar).await?.is_author)
    }

    /// True for editors and admins.
    pub async fn is_editor(&self, jar: &CookieJar) -> Result<bool, AppError> {
        Ok(self.permissions(jar).await?.is_editor)
    }

    /// Create a `USER` account. Does not log the new user in.
    #[instrument(skip_all)]
    pub async fn register(&self, req: RegisterRequest) -> Result<PublicUser, AppError> {
        let name = validate_name(&req.name)?.to_string();
        let email = normalize_email(&req.email);
        validate_email(&email)?;
        validate_password(&req.password, &self.password_requirements)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let requested = match req.username.as_deref() {
            Some(requested) => {
                let requested = requested.trim().to_lowercase();
                validate_username(&requested)?;
                Some(requested)
            },
            None => None,
        };

        let password_hash = self.hash_password(&req.password).await?;

        // A derived name can be claimed by a concurrent registration between
        // the lookup and the insert; derive again when that happens.
        let mut attempts = 1;
        let user = loop {
            let username = match &requested {
                Some(requested) => requested.clone(),
                None => self.derive_username(&email).await?,
            };
            let new_user = NewUser {
                email: email.clone(),
                username,
                name: name.clone(),
                password_hash: password_hash.clone(),
                role: Role::User,
            };
            match self.store.insert(new_user).await {
                Err(StorageError::UsernameTaken(taken))
                    if requested.is_none() && attempts < MAX_USERNAME_ATTEMPTS =>
                {
                    debug!(username = %taken, "derived username claimed concurrently, retrying");
                    attempts += 1;
                },
                result => break result?,
            }
        };

        counter!(keys::REGISTER).increment(1);
        info!(user_id = %user.id, "user registered");
        Ok(user.to_public())
    }

    /// First free username of the form `base`, `base2`, `base3`, ...
    async fn derive_username(&self, email: &str) -> Result<String, AppError> {
        let base = username_from_email(email);
        for attempt in 1..=MAX_USERNAME_ATTEMPTS {
            let candidate = if attempt == 1 {
                base.clone()
            } else {
                format!("{base}{attempt}")
            };
            if self.store.find_by_username(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(AppError::Conflict(
            "Could not derive a free username; please choose one".to_string(),
        ))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
