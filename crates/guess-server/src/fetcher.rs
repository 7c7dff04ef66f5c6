//! Picks a random rapid game played by a community member.
//!
//! Network access goes through [`GameSource`] so the selection logic can be
//! driven by an in-memory source in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chess_core::game::{Game, GameSourceData};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::clients::backend::{BackendClient, RandomPlayer};
use crate::clients::chess_com::{archive_year, ArchivedGame, ChessComClient};
use crate::config::{Config, FetchSettings};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("{username} does not have enough rapid history")]
    InsufficientHistory { username: String },

    #[error("No archives in the eligible years for {username}")]
    NoArchivesFound { username: String },

    #[error("Couldn't find a suitable game after {attempts} attempts")]
    NoSuitableGame { attempts: usize },
}

impl FetchError {
    /// The game search came up empty, as opposed to a transport failure.
    pub fn is_not_found(&self) -> bool {
        !matches!(self, FetchError::Network(_))
    }
}

#[async_trait]
pub trait GameSource: Send + Sync {
    async fn random_player(&self) -> Result<RandomPlayer, FetchError>;
    async fn archives(&self, username: &str) -> Result<Vec<String>, FetchError>;
    async fn month_games(&self, archive_url: &str) -> Result<Vec<ArchivedGame>, FetchError>;
}

#[async_trait]
impl<T: GameSource + ?Sized> GameSource for Arc<T> {
    async fn random_player(&self) -> Result<RandomPlayer, FetchError> {
        (**self).random_player().await
    }

    async fn archives(&self, username: &str) -> Result<Vec<String>, FetchError> {
        (**self).archives(username).await
    }

    async fn month_games(&self, archive_url: &str) -> Result<Vec<ArchivedGame>, FetchError> {
        (**self).month_games(archive_url).await
    }
}

/// The live source: community backend plus the Chess.com public API.
pub struct HttpGameSource {
    backend: BackendClient,
    chess_com: ChessComClient,
}

impl HttpGameSource {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        Ok(Self {
            backend: BackendClient::new(&config.backend_url, timeout)?,
            chess_com: ChessComClient::new(&config.chess_com_api_url, timeout)?,
        })
    }
}

#[async_trait]
impl GameSource for HttpGameSource {
    async fn random_player(&self) -> Result<RandomPlayer, FetchError> {
        self.backend.random_player().await.map_err(FetchError::Network)
    }

    async fn archives(&self, username: &str) -> Result<Vec<String>, FetchError> {
        self.chess_com
            .fetch_archives(username)
            .await
            .map_err(FetchError::Network)
    }

    async fn month_games(&self, archive_url: &str) -> Result<Vec<ArchivedGame>, FetchError> {
        self.chess_com
            .fetch_month(archive_url)
            .await
            .map_err(FetchError::Network)
    }
}

/// Keep archives whose `/{year}/{month}` suffix falls in `settings.archive_years`.
pub fn filter_archives(archives: &[String], settings: &FetchSettings) -> Vec<String> {
    archives
        .iter()
        .filter(|url| archive_year(url).is_some_and(|y| settings.archive_years.contains(&y)))
        .cloned()
        .collect()
}

/// Standard rules, the configured time class, and not abandoned.
pub fn is_candidate_game(game: &ArchivedGame, settings: &FetchSettings) -> bool {
    game.rules == settings.rules
        && game.time_class == settings.time_class
        && !game.pgn.contains("Abandoned")
}

pub struct RandomGameFetcher<S> {
    source: S,
    settings: FetchSettings,
    rng: Mutex<StdRng>,
}

impl<S: GameSource> RandomGameFetcher<S> {
    pub fn new(source: S, settings: FetchSettings) -> Self {
        Self::with_rng(source, settings, StdRng::from_entropy())
    }

    pub fn with_rng(source: S, settings: FetchSettings, rng: StdRng) -> Self {
        Self {
            source,
            settings,
            rng: Mutex::new(rng),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Produce one playable game.
    ///
    /// Network errors abort immediately. Only "nothing usable in this
    /// archive" is retried, up to `max_game_attempts` times.
    pub async fn fetch_random_game(&self) -> Result<Game, FetchError> {
        let username = self.select_candidate().await?;

        let archives = self.source.archives(&username).await?;
        let eligible = filter_archives(&archives, &self.settings);
        if eligible.is_empty() {
            info!(%username, total = archives.len(), "No eligible archives");
            return Err(FetchError::NoArchivesFound { username });
        }

        self.pick_game(&username, &eligible).await
    }

    async fn select_candidate(&self) -> Result<String, FetchError> {
        let use_frequent = !self.settings.frequent_users.is_empty()
            && self.roll(self.settings.frequent_user_probability);
        if use_frequent {
            if let Some(username) = self.choose(&self.settings.frequent_users) {
                debug!(%username, "Picked frequent user");
                return Ok(username);
            }
        }

        let mut last_rejected = String::new();
        for _ in 0..self.settings.max_candidate_attempts.max(1) {
            let player = self.source.random_player().await?;
            let rapid = player.ratings.rapid.unwrap_or(0);
            if rapid < self.settings.min_rapid_rating {
                debug!(username = %player.chess_username, rapid, "Not enough rapid history");
                last_rejected = player.chess_username;
                continue;
            }
            debug!(username = %player.chess_username, rapid, "Picked backend player");
            return Ok(player.chess_username);
        }

        warn!(username = %last_rejected, "Ran out of candidates with rapid history");
        Err(FetchError::InsufficientHistory {
            username: last_rejected,
        })
    }

    async fn pick_game(&self, username: &str, archives: &[String]) -> Result<Game, FetchError> {
        let attempts = self.settings.max_game_attempts;

        for attempt in 1..=attempts {
            let Some(archive_url) = self.choose(archives) else {
                break;
            };

            let games = self.source.month_games(&archive_url).await?;
            let candidates: Vec<ArchivedGame> = games
                .into_iter()
                .filter(|g| is_candidate_game(g, &self.settings))
                .collect();

            let Some(picked) = self.choose(&candidates) else {
                debug!(attempt, %archive_url, "No candidate games in archive");
                continue;
            };

            let built = Game::assemble(GameSourceData {
                pgn: &picked.pgn,
                white: (&picked.white.username, picked.white.rating),
                black: (&picked.black.username, picked.black.rating),
                game_link: &picked.url,
                member: username,
            });

            match built {
                Ok((game, history)) => {
                    info!(
                        %username,
                        attempt,
                        plies = history.len(),
                        link = %game.game_link,
                        "Selected game"
                    );
                    return Ok(game);
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Discarding game");
                }
            }
        }

        warn!(%username, attempts, "No suitable game found");
        Err(FetchError::NoSuitableGame { attempts })
    }

    fn roll(&self, probability: f64) -> bool {
        self.rng.lock().gen_bool(probability.clamp(0.0, 1.0))
    }

    fn choose<T: Clone>(&self, items: &[T]) -> Option<T> {
        let mut rng = self.rng.lock();
        items.choose(&mut *rng).cloned()
    }
}
