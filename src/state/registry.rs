use crate::config::Config;
use crate::db::Db;
use crate::db::repo::{GameRepo, GameRepository, MemoryStore, PlayerRepo, PlayerRepository};
use crate::services::{AuthService, LobbyService, PlayService};
use crate::state::connections::ConnectionRegistry;
use crate::state::games::GameRegistry;
use std::sync::Arc;

pub struct Repos {
    pub player: Arc<dyn PlayerRepo>,
    pub game: Arc<dyn GameRepo>,
}

impl Repos {
    pub fn postgres(db: Arc<Db>) -> Self {
        Self {
            player: Arc::new(PlayerRepository::new(db.clone())),
            game: Arc::new(GameRepository::new(db)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            player: store.clone(),
            game: store,
        }
    }
}

pub struct Services {
    pub auth: Arc<AuthService>,
    pub lobby: Arc<LobbyService>,
    pub play: Arc<PlayService>,
}

pub struct Registry {
    pub config: Arc<Config>,
    pub repos: Arc<Repos>,
    pub services: Arc<Services>,
    pub connections: Arc<ConnectionRegistry>,
    pub games: Arc<GameRegistry>,
}

impl Registry {
    pub fn new(repos: Repos, config: Arc<Config>) -> Self {
        let repos = Arc::new(repos);
        let connections = Arc::new(ConnectionRegistry::new());
        let games = Arc::new(GameRegistry::new());

        let services = Arc::new(Services {
            auth: Arc::new(AuthService::new(repos.player.clone(), &config)),
            lobby: Arc::new(LobbyService::new(
                repos.game.clone(),
                repos.player.clone(),
                games.clone(),
            )),
            play: Arc::new(PlayService::new(
                repos.game.clone(),
                repos.player.clone(),
                connections.clone(),
                games.clone(),
            )),
        });

        Self {
            config,
            repos,
            services,
            connections,
            games,
        }
    }
}
