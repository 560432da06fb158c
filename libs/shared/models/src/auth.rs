use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

/// What an authenticated caller is allowed to act as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Publishes availability and accepts or rejects bookings.
    Provider,
    /// Books slots for a subject they own.
    Requester,
    Admin,
}

impl ActorRole {
    /// Maps the free-form role claim onto a closed role. Unknown or missing
    /// claims fall back to `Requester`, the least privileged role.
    pub fn from_claim(role: Option<&str>) -> Self {
        match role.map(|r| r.trim().to_ascii_lowercase()) {
            Some(r) if r == "provider" || r == "vet" || r == "veterinarian" => ActorRole::Provider,
            Some(r) if r == "admin" => ActorRole::Admin,
            _ => ActorRole::Requester,
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Provider => write!(f, "provider"),
            ActorRole::Requester => write!(f, "requester"),
            ActorRole::Admin => write!(f, "admin"),
        }
    }
}

/// Explicit caller identity handed to every engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub role: ActorRole,
}

impl ActorContext {
    pub fn new(actor_id: Uuid, role: ActorRole) -> Self {
        Self { actor_id, role }
    }

    pub fn provider(actor_id: Uuid) -> Self {
        Self::new(actor_id, ActorRole::Provider)
    }

    pub fn requester(actor_id: Uuid) -> Self {
        Self::new(actor_id, ActorRole::Requester)
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }

    /// True when the actor is `owner` itself or an admin.
    pub fn acts_for(&self, owner: Uuid) -> bool {
        self.actor_id == owner || self.is_admin()
    }
}

impl TryFrom<&User> for ActorContext {
    type Error = AppError;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        let actor_id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))?;
        Ok(Self::new(actor_id, ActorRole::from_claim(user.role.as_deref())))
    }
}
