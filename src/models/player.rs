use crate::db::DbResult;
use crate::error::{AppResult, DomainError};
use crate::models::types::PlayerId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_postgres::Row;

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub password_hash: String,
    /// Clear while the player is connected to a game
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn new(username: &str, password_hash: String) -> Self {
        Self {
            id: PlayerId::new(),
            username: username.to_string(),
            password_hash,
            available: true,
            created_at: Utc::now(),
        }
    }

    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get::<_, PlayerId>("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            available: row.try_get("available")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub fn validate_username(s: &str) -> AppResult<()> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::Validation { field: "username", message: "cannot be empty".into() });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' )) {
            return Err(DomainError::Validation {
                field: "username",
                message: "only alphanumeric, hyphen, underscore allowed".into(),
            });
        }
        Ok(())
    }
}

/// What other players may see.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerPublic {
    pub id: PlayerId,
    pub username: String,
    pub available: bool,
}

impl From<&Player> for PlayerPublic {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            username: p.username.clone(),
            available: p.available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(Player::validate_username("alice").is_ok());
        assert!(Player::validate_username("bob_the-2nd").is_ok());
        assert!(Player::validate_username("  ").is_err());
        assert!(Player::validate_username("bad name").is_err());
        assert!(Player::validate_username("émile").is_err());
    }

    #[test]
    fn new_players_are_available() {
        let p = Player::new("alice", "hash".into());
        assert!(p.available);
        assert!(!PlayerPublic::from(&p).username.is_empty());
    }
}
