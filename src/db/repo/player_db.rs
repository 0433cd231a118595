use crate::db::repo::player::PlayerRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::player::Player;
use crate::models::types::PlayerId;
use std::sync::Arc;

pub struct PlayerRepository {
    db: Arc<Db>,
}

impl PlayerRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait::async_trait]
impl PlayerRepo for PlayerRepository {
    async fn get_by_username(&self, username: &str) -> DbResult<Option<Player>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT * FROM players WHERE username = $1")
            .await?;

        let row_opt = client.query_opt(&stmt, &[&username]).await?;
        map_row_opt(
            row_opt,
            Player::try_from_row,
            &format!("PlayerRepo::get_by_username username={}", username),
        )
    }

    async fn get_by_id(&self, player_id: PlayerId) -> DbResult<Option<Player>> {
        let client = self.db.get_client().await?;

        let stmt = client.prepare_cached("SELECT * FROM players WHERE id = $1").await?;

        let row_opt = client.query_opt(&stmt, &[&player_id]).await?;
        map_row_opt(
            row_opt,
            Player::try_from_row,
            &format!("PlayerRepo::get_by_id id={}", player_id),
        )
    }

    async fn insert_player(&self, player: Player) -> DbResult<Player> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
            INSERT INTO players (id, username, password_hash, available, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, password_hash, available, created_at
            "#,
            )
            .await?;

        let row = client
            .query_one(
                &stmt,
                &[
                    &player.id,
                    &player.username,
                    &player.password_hash,
                    &player.available,
                    &player.created_at,
                ],
            )
            .await?;

        Player::try_from_row(&row)
    }

    async fn save_player(&self, player: &Player) -> DbResult<()> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("UPDATE players SET available = $2 WHERE id = $1")
            .await?;
        client.execute(&stmt, &[&player.id, &player.available]).await?;

        Ok(())
    }

    async fn list_available(&self, except: PlayerId) -> DbResult<Vec<Player>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT * FROM players WHERE available AND id <> $1 ORDER BY username")
            .await?;

        let rows = client.query(&stmt, &[&except]).await?;
        rows.iter().map(Player::try_from_row).collect()
    }
}
