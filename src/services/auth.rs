use crate::config::Config;
use crate::db::error::DbError;
use crate::db::repo::PlayerRepo;
use crate::error::{AppResult, DomainError};
use crate::models::player::Player;
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    kind: TokenKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

pub struct AuthService {
    repo: Arc<dyn PlayerRepo>,
    argon: Argon2<'static>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(repo: Arc<dyn PlayerRepo>, config: &Config) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            repo,
            argon: Argon2::default(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::minutes(config.access_token_expire_minutes),
            refresh_ttl: Duration::days(config.refresh_token_expire_days),
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<Player> {
        Player::validate_username(username)?;
        if password.is_empty() {
            return Err(DomainError::Validation { field: "password", message: "cannot be empty".into() });
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(DomainError::Password)?
            .to_string();

        match self.repo.insert_player(Player::new(username.trim(), hash)).await {
            Ok(player) => Ok(player),
            Err(DbError::UniqueViolation) => Err(DomainError::Conflict(format!(
                "User with name \"{}\" already exists.",
                username.trim()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<Player> {
        let Some(player) = self.repo.get_by_username(username).await? else {
            tracing::warn!(%username, "authentication failed: unknown player");
            return Err(DomainError::BadCredentials);
        };

        let parsed = PasswordHash::new(&player.password_hash).map_err(DomainError::Password)?;
        if self.argon.verify_password(password.as_bytes(), &parsed).is_err() {
            tracing::warn!(%username, "authentication failed: invalid password");
            return Err(DomainError::BadCredentials);
        }

        Ok(player)
    }

    /// Checks the password and issues a fresh access/refresh token pair.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenPair> {
        let player = self.authenticate(username, password).await?;
        Ok(TokenPair {
            access_token: self.issue(&player.username, TokenKind::Access)?,
            refresh_token: self.issue(&player.username, TokenKind::Refresh)?,
            token_type: "bearer",
        })
    }

    /// Trades a refresh token for a new access token. The refresh token is handed back unchanged.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let player = self.resolve(refresh_token, TokenKind::Refresh).await?;
        Ok(TokenPair {
            access_token: self.issue(&player.username, TokenKind::Access)?,
            refresh_token: refresh_token.to_string(),
            token_type: "bearer",
        })
    }

    /// Resolves a bearer access token to the player it was issued for.
    pub async fn verify_access(&self, token: &str) -> AppResult<Player> {
        self.resolve(token, TokenKind::Access).await
    }

    fn issue(&self, username: &str, kind: TokenKind) -> AppResult<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: username.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
            kind,
        };
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    async fn resolve(&self, token: &str, kind: TokenKind) -> AppResult<Player> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                DomainError::Unauthorized
            })?;
        if data.claims.kind != kind {
            return Err(DomainError::Unauthorized);
        }

        self.repo
            .get_by_username(&data.claims.sub)
            .await?
            .ok_or(DomainError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), &Config::ephemeral("test-secret"))
    }

    #[tokio::test]
    async fn register_login_and_verify() {
        let auth = service();
        let alice = auth.register("alice", "hunter2").await.unwrap();
        assert!(alice.available);

        let tokens = auth.login("alice", "hunter2").await.unwrap();
        assert_eq!(tokens.token_type, "bearer");

        let who = auth.verify_access(&tokens.access_token).await.unwrap();
        assert_eq!(who.id, alice.id);
    }

    #[tokio::test]
    async fn duplicate_usernames_conflict() {
        let auth = service();
        auth.register("alice", "pw").await.unwrap();
        let err = auth.register("alice", "other").await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let auth = service();
        auth.register("alice", "right").await.unwrap();
        assert!(matches!(auth.login("alice", "wrong").await, Err(DomainError::BadCredentials)));
        assert!(matches!(auth.login("nobody", "right").await, Err(DomainError::BadCredentials)));
    }

    #[tokio::test]
    async fn token_kinds_are_not_interchangeable() {
        let auth = service();
        auth.register("alice", "pw").await.unwrap();
        let tokens = auth.login("alice", "pw").await.unwrap();

        assert!(matches!(
            auth.verify_access(&tokens.refresh_token).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(auth.refresh(&tokens.access_token).await, Err(DomainError::Unauthorized)));

        let renewed = auth.refresh(&tokens.refresh_token).await.unwrap();
        assert_eq!(renewed.refresh_token, tokens.refresh_token);
        assert!(auth.verify_access(&renewed.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn foreign_tokens_are_unauthorized() {
        let auth = service();
        auth.register("alice", "pw").await.unwrap();
        let other = AuthService::new(Arc::new(MemoryStore::new()), &Config::ephemeral("other-secret"));
        other.register("alice", "pw").await.unwrap();
        let forged = other.login("alice", "pw").await.unwrap();

        assert!(matches!(
            auth.verify_access(&forged.access_token).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(matches!(auth.verify_access("garbage").await, Err(DomainError::Unauthorized)));
    }
}
