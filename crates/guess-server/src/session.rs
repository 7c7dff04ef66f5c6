//! Per-viewer game controller.
//!
//! Owns the round state and the `loading` flag. Callers drive it with
//! [`Action`]s and observe it through a `watch` channel of
//! [`SessionSnapshot`]s. The state lock is never held across a fetch, and
//! every snapshot is taken under the lock, so the move index and board are
//! always published together.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chess_core::clock::EMPTY_CLOCK;
use chess_core::{MoveCategory, Seat, Side};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::config::FetchSettings;
use crate::fetcher::{FetchError, GameSource, RandomGameFetcher};
use crate::round::{GuessOutcome, Phase, RoundError, RoundState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartGuessing,
    SubmitGuess(i32),
    NextGame,
    NextMove,
    PreviousMove,
    FirstMove,
    LastMove,
    GoToMove(usize),
    FlipBoard,
}

/// Whether an action changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    Applied,
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Round(#[from] RoundError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub label: String,
    pub side: Side,
    /// Hidden until the reveal.
    pub rating: Option<i32>,
    pub clock: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub date: String,
    pub start_time: String,
    pub time_control: String,
    /// The following are only filled in after the reveal.
    pub result: Option<String>,
    pub termination_message: Option<String>,
    pub game_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub loading: bool,
    pub error: Option<String>,
    pub move_index: usize,
    pub total_moves: usize,
    /// SAN of every half-move, for the move list.
    pub moves: Vec<String>,
    pub fen: Option<String>,
    pub last_move: Option<String>,
    /// Category of the move just entered, for the sound cue.
    pub cue: Option<MoveCategory>,
    pub is_checkmate: bool,
    pub orientation: Side,
    pub top: SeatView,
    pub bottom: SeatView,
    pub game: Option<GameInfo>,
    pub outcome: Option<GuessOutcome>,
    pub feedback: Option<String>,
}

#[derive(Default)]
struct Inner {
    round: RoundState,
    loading: bool,
    error: Option<String>,
    cue: Option<MoveCategory>,
}

impl Inner {
    fn snapshot(&self) -> SessionSnapshot {
        let revealed = self.round.phase() == Phase::Revealed;
        let replay = self.round.replay();
        let game = self.round.game();

        let seat = |seat: Seat| {
            let side = self.round.seat_side(seat);
            SeatView {
                label: self.round.seat_label(seat),
                side,
                rating: game.filter(|_| revealed).map(|g| g.player(side).rating),
                clock: replay
                    .map(|r| r.clock_time(seat).to_string())
                    .unwrap_or_else(|| EMPTY_CLOCK.to_string()),
            }
        };

        let outcome = self.round.outcome().copied();

        SessionSnapshot {
            phase: self.round.phase(),
            loading: self.loading,
            error: self.error.clone(),
            move_index: replay.map_or(0, |r| r.current_move_index()),
            total_moves: replay.map_or(0, |r| r.total_moves()),
            moves: replay.map(|r| r.sans().to_vec()).unwrap_or_default(),
            fen: replay.map(|r| r.fen()),
            last_move: replay.and_then(|r| r.current_san()).map(str::to_string),
            cue: self.cue,
            is_checkmate: replay.is_some_and(|r| r.is_checkmate()),
            orientation: self.round.seat_side(Seat::Bottom),
            top: seat(Seat::Top),
            bottom: seat(Seat::Bottom),
            game: game.map(|g| GameInfo {
                date: g.date.clone(),
                start_time: g.start_time.clone(),
                time_control: g.time_control.clone(),
                result: revealed.then(|| g.result.clone()),
                termination_message: revealed.then(|| g.termination_message.clone()),
                game_link: revealed.then(|| g.game_link.clone()),
            }),
            outcome,
            feedback: outcome.map(|o| o.verdict.message().to_string()),
        }
    }
}

#[derive(Clone, Copy)]
enum Load {
    Start,
    Next,
}

pub struct GameSession<S> {
    fetcher: RandomGameFetcher<S>,
    inner: Mutex<Inner>,
    tx: watch::Sender<SessionSnapshot>,
}

impl<S: GameSource> GameSession<S> {
    pub fn new(fetcher: RandomGameFetcher<S>) -> Self {
        let inner = Inner::default();
        let (tx, _rx) = watch::channel(inner.snapshot());
        Self {
            fetcher,
            inner: Mutex::new(inner),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }

    pub async fn dispatch(&self, action: Action) -> Result<Dispatch, SessionError> {
        debug!(?action, "Dispatch");
        match action {
            Action::StartGuessing => self.load(Load::Start).await,
            Action::NextGame => self.load(Load::Next).await,
            Action::SubmitGuess(value) => self.submit_guess(value),
            Action::NextMove => Ok(self.navigate(|r| r.next())),
            Action::PreviousMove => Ok(self.navigate(|r| r.previous())),
            Action::FirstMove => Ok(self.navigate(|r| r.first())),
            Action::LastMove => Ok(self.navigate(|r| r.last())),
            Action::GoToMove(index) => Ok(self.navigate(|r| r.go_to_move(index))),
            Action::FlipBoard => Ok(self.flip()),
        }
    }

    async fn load(&self, kind: Load) -> Result<Dispatch, SessionError> {
        {
            let mut inner = self.inner.lock();
            if inner.loading {
                debug!("Fetch already in flight, ignoring");
                return Ok(Dispatch::Ignored);
            }
            let (expected, action) = match kind {
                Load::Start => (Phase::Initial, "start guessing"),
                Load::Next => (Phase::Revealed, "load the next game"),
            };
            let phase = inner.round.phase();
            if phase != expected {
                return Err(RoundError::InvalidState { action, phase }.into());
            }
            inner.loading = true;
            inner.error = None;
            self.publish(&inner);
        }

        let guard = LoadingGuard { session: self, armed: true };
        let fetched = self.fetcher.fetch_random_game().await;
        guard.disarm();

        let mut inner = self.inner.lock();
        inner.loading = false;

        let result = fetched.map_err(SessionError::from).and_then(|game| {
            let game = Arc::new(game);
            match kind {
                Load::Start => inner.round.start_guessing(game),
                Load::Next => inner.round.next_game(game),
            }
            .map_err(SessionError::from)
        });

        match result {
            Ok(()) => {
                inner.cue = None;
                info!(
                    total_moves = inner.round.replay().map_or(0, |r| r.total_moves()),
                    "Game loaded"
                );
                self.publish(&inner);
                Ok(Dispatch::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load game");
                inner.error = Some(e.to_string());
                self.publish(&inner);
                Err(e)
            }
        }
    }

    fn submit_guess(&self, value: i32) -> Result<Dispatch, SessionError> {
        let mut inner = self.inner.lock();
        let outcome = inner.round.submit_guess(value)?;
        info!(
            guessed = outcome.guessed_elo,
            actual = outcome.actual_elo,
            difference = outcome.difference,
            "Guess revealed"
        );
        self.publish(&inner);
        Ok(Dispatch::Applied)
    }

    fn navigate(&self, step: impl FnOnce(&mut chess_core::Replay) -> Option<MoveCategory>) -> Dispatch {
        let mut inner = self.inner.lock();
        let Some(replay) = inner.round.replay_mut() else {
            return Dispatch::Ignored;
        };
        let Some(cue) = step(replay) else {
            return Dispatch::Ignored;
        };
        debug!(?cue, "Move entered");
        inner.cue = Some(cue);
        self.publish(&inner);
        Dispatch::Applied
    }

    fn flip(&self) -> Dispatch {
        let mut inner = self.inner.lock();
        let Some(replay) = inner.round.replay_mut() else {
            return Dispatch::Ignored;
        };
        replay.flip_orientation();
        inner.cue = None;
        self.publish(&inner);
        Dispatch::Applied
    }

    fn publish(&self, inner: &Inner) {
        self.tx.send_replace(inner.snapshot());
    }
}

/// Clears `loading` if a fetch is dropped before it completes, so a
/// cancelled request never leaves the session refusing new loads.
struct LoadingGuard<'a, S: GameSource> {
    session: &'a GameSession<S>,
    armed: bool,
}

impl<S: GameSource> LoadingGuard<'_, S> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S: GameSource> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Game fetch cancelled");
        let mut inner = self.session.inner.lock();
        inner.loading = false;
        self.session.publish(&inner);
    }
}

/// Bounds on how many sessions the registry keeps alive.
#[derive(Clone, Copy, Debug)]
pub struct SessionLimits {
    /// Sessions untouched for this long are dropped on the next insert.
    pub idle_ttl: Duration,
    /// Beyond this, the least recently used session is dropped.
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            max_sessions: 10_000,
        }
    }
}

struct SessionEntry<S> {
    session: Arc<GameSession<Arc<S>>>,
    last_seen: Mutex<Instant>,
}

/// One session per viewer, created on first use and evicted when idle.
pub struct SessionRegistry<S> {
    source: Arc<S>,
    settings: FetchSettings,
    limits: SessionLimits,
    sessions: RwLock<HashMap<String, SessionEntry<S>>>,
}

impl<S: GameSource> SessionRegistry<S> {
    pub fn new(source: S, settings: FetchSettings) -> Self {
        Self {
            source: Arc::new(source),
            settings,
            limits: SessionLimits::default(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub async fn session(&self, key: &str) -> Arc<GameSession<Arc<S>>> {
        if let Some(entry) = self.sessions.read().await.get(key) {
            *entry.last_seen.lock() = Instant::now();
            return entry.session.clone();
        }

        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get(key) {
            *entry.last_seen.lock() = Instant::now();
            return entry.session.clone();
        }

        self.evict(&mut sessions);

        debug!(key, "New game session");
        let fetcher = RandomGameFetcher::new(self.source.clone(), self.settings.clone());
        let session = Arc::new(GameSession::new(fetcher));
        sessions.insert(
            key.to_string(),
            SessionEntry {
                session: session.clone(),
                last_seen: Mutex::new(Instant::now()),
            },
        );
        session
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop idle sessions, then the least recently used ones until there
    /// is room for one more.
    fn evict(&self, sessions: &mut HashMap<String, SessionEntry<S>>) {
        let before = sessions.len();
        let idle_ttl = self.limits.idle_ttl;
        sessions.retain(|_, entry| entry.last_seen.lock().elapsed() < idle_ttl);

        while !sessions.is_empty() && sessions.len() >= self.limits.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| *entry.last_seen.lock())
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    sessions.remove(&key);
                }
                None => break,
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted game sessions");
        }
    }
}
