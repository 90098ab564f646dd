// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! User storage abstraction with flat-file implementation.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use folio_common::{PublicUser, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{fs as tokio_fs, sync::Mutex};
use tracing::{debug, instrument};

/// Errors raised by a user store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store could not be reached or written
    #[error("user store unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// The store's contents could not be decoded
    #[error("user store corrupt: {0}")]
    Corrupt(String),

    /// The email is already registered
    #[error("{0}")]
    Conflict(String),

    /// The username is already taken
    #[error("User with this username already exists: {0}")]
    UsernameTaken(String),
}

/// Persisted user record, including the password hash.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Client-safe projection without the password hash.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role,
            avatar: self.avatar.clone(),
            bio: self.bio.clone(),
        }
    }
}

/// Data for a user that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
}

/// Lookup and creation of user records.
///
/// Implementations enforce email and username uniqueness in `insert`.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by (normalised) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// Find a user by id
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// Create a user, assigning its id and timestamps
    async fn insert(&self, user: NewUser) -> Result<User, StorageError>;
}

#[async_trait::async_trait]
impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        (**self).find_by_username(username).await
    }

    async fn insert(&self, user: NewUser) -> Result<User, StorageError> {
        (**self).insert(user).await
    }
}

/// Flat-file implementation of [`UserStore`]
///
/// All users live in a single `users.json` document under the root
/// directory. Writers hold `write_lock` for the whole read-modify-write and
/// replace the file atomically.
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn users_path(&self) -> PathBuf {
        self.root.join("users.json")
    }

    async fn load(&self) -> Result<Vec<User>, StorageError> {
        let path = self.users_path();
        match tokio_fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| StorageError::Corrupt(e.to_string()))
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StorageError::Unavailable(e)),
        }
    }

    async fn save(&self, users: &[User]) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(users)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let root = self.root.clone();
        let path = self.users_path();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
            tmp.write_all(&json)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Unavailable(std::io::Error::other(e)))??;
        Ok(())
    }

    async fn find<F>(&self, pred: F) -> Result<Option<User>, StorageError>
    where
        F: Fn(&User) -> bool,
    {
        Ok(self.load().await?.into_iter().find(|u| pred(u)))
    }
}

#[async_trait::async_trait]
impl UserStore for FlatFileStorage {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.find(|u| u.email.eq_ignore_ascii_case(email)).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        self.find(|u| u.id == id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        self.find(|u| u.username == username).await
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert(&self, user: NewUser) -> Result<User, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.load().await?;

        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StorageError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(StorageError::UsernameTaken(user.username));
        }

        let now = Utc::now();
        let created = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: user.email,
            username: user.username,
            name: user.name,
            password_hash: user.password_hash,
            role: user.role,
            avatar: None,
            bio: None,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        self.save(&users).await?;

        debug!(user_id = %created.id, "user stored");
        Ok(created)
    }
}
