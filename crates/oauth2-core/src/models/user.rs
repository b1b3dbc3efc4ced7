use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resource owner able to use the password grant.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a user whose password is hashed with Argon2id.
    pub fn with_password(
        username: String,
        password: &str,
    ) -> Result<Self, argon2::password_hash::Error> {
        let hash = crate::hash_password(password)?;
        Ok(Self::new(username, hash))
    }
}
