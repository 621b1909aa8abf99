/// User record store collaborator.
///
/// The auth core only touches user records through this narrow
/// interface; the backing engine is the operator's choice. The in-memory
/// implementation backs tests and single-process deployments.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// A user account. Immutable once created except through the narrow
/// mutations below; never hard-deleted by this service.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Never exposed outward
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an account. The password arrives pre-hashed;
/// plaintext never crosses this seam.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ApiError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, ApiError>;
    /// Create an account; fails with `UserAlreadyExists` when the email
    /// is taken. Uniqueness is enforced here, atomically.
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, ApiError>;
    /// One-way transition; marking an already-verified user is a no-op.
    async fn mark_verified(&self, id: Uuid) -> Result<(), ApiError>;
    async fn update_password(&self, id: Uuid, password_hash: String) -> Result<(), ApiError>;
}

#[derive(Default)]
pub struct InMemoryUserStore {
    records: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub fn count(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    fn lock_err() -> ApiError {
        ApiError::Internal("user store lock poisoned".to_string())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ApiError> {
        let records = self.records.read().map_err(|_| Self::lock_err())?;
        Ok(records.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, ApiError> {
        let records = self.records.read().map_err(|_| Self::lock_err())?;
        Ok(records.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<UserRecord, ApiError> {
        let mut records = self.records.write().map_err(|_| Self::lock_err())?;

        if records.values().any(|u| u.email == new_user.email) {
            return Err(ApiError::UserAlreadyExists);
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: new_user.password_hash,
            is_verified: false,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), ApiError> {
        let mut records = self.records.write().map_err(|_| Self::lock_err())?;
        let record = records.get_mut(&id).ok_or(ApiError::UserNotFound)?;
        if !record.is_verified {
            record.is_verified = true;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> Result<(), ApiError> {
        let mut records = self.records.write().map_err(|_| Self::lock_err())?;
        let record = records.get_mut(&id).ok_or(ApiError::UserNotFound)?;
        record.password_hash = password_hash;
        record.updated_at = Utc::now();
        Ok(())
    }
}
