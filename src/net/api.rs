use crate::error::DomainError;
use crate::models::game::GameView;
use crate::models::player::{Player, PlayerPublic};
use crate::net::AppCtx;
use crate::services::TokenPair;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;

const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
const PLAYER2_NAME_HEADER: &str = "player2-name";

/// Error body is always `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl<E> From<E> for ApiError
where
    E: Into<DomainError>,
{
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::GameNotFound | DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::NotParticipant => StatusCode::FORBIDDEN,
            DomainError::AlreadyConnected | DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Unauthorized | DomainError::BadCredentials => StatusCode::UNAUTHORIZED,
            DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(%status, error = %self.0, "request refused");
            self.0.to_string()
        };

        let mut response = (status, Json(serde_json::json!({ "detail": detail }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Player resolved from an `Authorization: Bearer <access token>` header.
pub struct AuthPlayer(pub Player);

impl FromRequestParts<AppCtx> for AuthPlayer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppCtx) -> Result<Self, Self::Rejection> {
        let token = header(&parts.headers, AUTHORIZATION.as_str())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(DomainError::Unauthorized)?;

        let player = ctx.registry.services.auth.verify_access(token.trim()).await?;
        Ok(AuthPlayer(player))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub async fn register(State(ctx): State<AppCtx>, Json(body): Json<Credentials>) -> ApiResult<Json<PlayerPublic>> {
    let player = ctx
        .registry
        .services
        .auth
        .register(&body.username, &body.password)
        .await?;
    tracing::info!(player = %player.username, "player registered");
    Ok(Json(PlayerPublic::from(&player)))
}

pub async fn login(State(ctx): State<AppCtx>, Form(form): Form<Credentials>) -> ApiResult<Json<TokenPair>> {
    let tokens = ctx.registry.services.auth.login(&form.username, &form.password).await?;
    Ok(Json(tokens))
}

pub async fn refresh_token(State(ctx): State<AppCtx>, headers: HeaderMap) -> ApiResult<Json<TokenPair>> {
    let token = header(&headers, REFRESH_TOKEN_HEADER).ok_or(DomainError::Unauthorized)?;
    let tokens = ctx.registry.services.auth.refresh(token).await?;
    Ok(Json(tokens))
}

pub async fn available_players(
    State(ctx): State<AppCtx>,
    AuthPlayer(player): AuthPlayer,
) -> ApiResult<Json<Vec<PlayerPublic>>> {
    let players = ctx.registry.services.lobby.available_players(&player).await?;
    Ok(Json(players))
}

pub async fn create_game(
    State(ctx): State<AppCtx>,
    AuthPlayer(player): AuthPlayer,
    headers: HeaderMap,
) -> ApiResult<Json<GameView>> {
    let Some(opponent) = header(&headers, PLAYER2_NAME_HEADER) else {
        return Err(DomainError::Validation {
            field: "player2-name",
            message: "header is required".into(),
        }
        .into());
    };

    let game = ctx.registry.services.lobby.create_game(&player, opponent).await?;
    Ok(Json(game))
}

pub async fn active_games(State(ctx): State<AppCtx>, AuthPlayer(player): AuthPlayer) -> ApiResult<Json<Vec<GameView>>> {
    let games = ctx.registry.services.lobby.active_games(&player).await?;
    Ok(Json(games))
}

pub async fn stats(State(ctx): State<AppCtx>, Path(name): Path<String>) -> ApiResult<Json<Vec<GameView>>> {
    let games = ctx.registry.services.lobby.stats(&name).await?;
    Ok(Json(games))
}
