use crate::db::error::DbError;
use crate::db::repo::GameRepo;
use crate::db::{Db, DbResult};
use crate::models::board::Board;
use crate::models::game::{Game, Seat};
use crate::models::types::{GameId, PlayerId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_postgres::Row;

pub struct GameRepository {
    db: Arc<Db>,
}

impl GameRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

fn board_from_row(row: &Row) -> DbResult<(Seat, Board)> {
    let seat: i16 = row.try_get("seat")?;
    let seat = usize::try_from(seat)
        .ok()
        .and_then(Seat::from_index)
        .ok_or_else(|| DbError::Decode(format!("invalid board seat {seat}")))?;

    let ships: serde_json::Value = row.try_get("ships")?;
    let attacked: serde_json::Value = row.try_get("attacked")?;

    Ok((
        seat,
        Board {
            ships: serde_json::from_value(ships)?,
            attacked: serde_json::from_value(attacked)?,
        },
    ))
}

fn boards_from_rows<'a>(rows: impl IntoIterator<Item = &'a Row>) -> DbResult<[Board; 2]> {
    let mut boards: [Board; 2] = Default::default();
    for row in rows {
        let (seat, board) = board_from_row(row)?;
        boards[seat.index()] = board;
    }
    Ok(boards)
}

#[async_trait::async_trait]
impl GameRepo for GameRepository {
    async fn insert_game(&self, game: &Game) -> DbResult<()> {
        let mut client = self.db.get_client().await?;
        let tx = client.transaction().await?;

        tx.execute(
            r#"
            INSERT INTO games (id, player1_id, player1_name, player2_id, player2_name, result, next_turn, created_at, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            &[
                &game.id,
                &game.player1_id,
                &game.player1_name,
                &game.player2_id,
                &game.player2_name,
                &game.result.as_str(),
                &game.next_turn,
                &game.created_at,
                &game.end_date,
            ],
        )
        .await?;

        for (seat, board) in game.boards.iter().enumerate() {
            let ships = serde_json::to_value(&board.ships)?;
            let attacked = serde_json::to_value(&board.attacked)?;
            tx.execute(
                "INSERT INTO boards (game_id, seat, ships, attacked) VALUES ($1, $2, $3, $4)",
                &[&game.id, &(seat as i16), &ships, &attacked],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_game(&self, game_id: GameId) -> DbResult<Option<Game>> {
        let client = self.db.get_client().await?;

        let Some(row) = client
            .query_opt("SELECT * FROM games WHERE id = $1", &[&game_id])
            .await?
        else {
            return Ok(None);
        };

        let board_rows = client
            .query("SELECT seat, ships, attacked FROM boards WHERE game_id = $1", &[&game_id])
            .await?;

        let boards = boards_from_rows(&board_rows)?;
        Game::try_from_row(&row, boards).map(Some)
    }

    async fn save_game(&self, game: &Game) -> DbResult<()> {
        let mut client = self.db.get_client().await?;
        let tx = client.transaction().await?;

        let updated = tx
            .execute(
                "UPDATE games SET result = $2, next_turn = $3, end_date = $4 WHERE id = $1",
                &[&game.id, &game.result.as_str(), &game.next_turn, &game.end_date],
            )
            .await?;
        if updated == 0 {
            return Err(DbError::NotFound);
        }

        for (seat, board) in game.boards.iter().enumerate() {
            let ships = serde_json::to_value(&board.ships)?;
            let attacked = serde_json::to_value(&board.attacked)?;
            tx.execute(
                r#"
                INSERT INTO boards (game_id, seat, ships, attacked) VALUES ($1, $2, $3, $4)
                ON CONFLICT (game_id, seat)
                DO UPDATE SET ships = EXCLUDED.ships, attacked = EXCLUDED.attacked
                "#,
                &[&game.id, &(seat as i16), &ships, &attacked],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_for_player(&self, player_id: PlayerId, finished: bool) -> DbResult<Vec<Game>> {
        let client = self.db.get_client().await?;

        let rows = client
            .query(
                r#"
                SELECT * FROM games
                WHERE (player1_id = $1 OR player2_id = $1)
                  AND (result IN ('player 1 win', 'player 2 win')) = $2
                ORDER BY created_at
                "#,
                &[&player_id, &finished],
            )
            .await?;

        let ids: Vec<GameId> = rows
            .iter()
            .map(|r| r.try_get("id"))
            .collect::<Result<_, _>>()?;

        let board_rows = client
            .query(
                "SELECT game_id, seat, ships, attacked FROM boards WHERE game_id = ANY($1)",
                &[&ids],
            )
            .await?;

        let mut by_game: HashMap<GameId, Vec<&Row>> = HashMap::new();
        for row in &board_rows {
            let game_id: GameId = row.try_get("game_id")?;
            by_game.entry(game_id).or_default().push(row);
        }

        rows.iter()
            .map(|row| {
                let id: GameId = row.try_get("id")?;
                let boards = boards_from_rows(by_game.remove(&id).unwrap_or_default())?;
                Game::try_from_row(row, boards)
            })
            .collect()
    }
}
