use crate::Registry;
use crate::error::DomainError;
use crate::models::message::Notice;
use crate::models::types::GameId;
use crate::net::AppCtx;
use crate::net::api::ApiResult;
use crate::net::output::{OutputHandle, SessionOut};
use crate::net::sink::websocket::WebSocketSink;
use crate::services::{Flow, Participant};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PlayQuery {
    token: Option<String>,
}

/// `GET /games/{game_id}/play?token=...`
///
/// The player is admitted before the handshake, so refusals are plain HTTP errors and the game
/// announcements are already queued once the socket opens.
pub async fn play_upgrade(
    ws: WebSocketUpgrade,
    Path(game_id): Path<String>,
    Query(query): Query<PlayQuery>,
    State(ctx): State<AppCtx>,
) -> ApiResult<Response> {
    let services = &ctx.registry.services;

    let token = query.token.ok_or(DomainError::Unauthorized)?;
    let player = services.auth.verify_access(&token).await?;
    let game_id: GameId = game_id.parse().map_err(|_| DomainError::GameNotFound)?;

    let (output, session_out) = OutputHandle::channel();
    let me = services.play.join(game_id, player, output).await?;

    let play = services.play.clone();
    let abandoned = me.clone();
    let registry = ctx.registry.clone();

    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!(game_id = %abandoned.game_id, error = %e, "websocket upgrade failed");
            tokio::spawn(async move {
                if let Err(e) = play.leave(&abandoned).await {
                    tracing::error!(game_id = %abandoned.game_id, error = %e, "cleanup after failed upgrade");
                }
            });
        })
        .on_upgrade(move |socket| play_socket(socket, registry, me, session_out)))
}

async fn play_socket(socket: WebSocket, registry: Arc<Registry>, me: Participant, session_out: SessionOut) {
    let (ws_write, mut ws_read) = socket.split();
    let play = registry.services.play.clone();

    // The writer drains the queue until a close frame or until every handle is gone.
    let game_id = me.game_id;
    tokio::spawn(async move {
        if let Err(e) = session_out.run(WebSocketSink::new(ws_write)).await {
            tracing::debug!(%game_id, error = %e, "websocket writer stopped");
        }
    });

    while let Some(msg) = ws_read.next().await {
        let text = match msg {
            Ok(Message::Text(t)) => t.to_string(),
            Ok(Message::Binary(b)) => match String::from_utf8(b.to_vec()) {
                Ok(s) => s,
                Err(_) => {
                    me.output().message(Notice::Invalid);
                    continue;
                }
            },
            // Axum answers pings itself
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(%game_id, player = %me.player.username, error = %e, "websocket read failed");
                break;
            }
        };

        match play.handle_frame(&me, &text).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Finished) => break,
            Err(e) => {
                tracing::error!(%game_id, player = %me.player.username, error = %e, "move failed");
                break;
            }
        }
    }

    if let Err(e) = play.leave(&me).await {
        tracing::error!(%game_id, player = %me.player.username, error = %e, "leave failed");
    }
}
