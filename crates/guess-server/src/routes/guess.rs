use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Extension, Json};
use futures::Stream;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::auth::middleware::Viewer;
use crate::error::AppError;
use crate::fetcher::GameSource;
use crate::session::{Action, Dispatch, GameSession, SessionRegistry, SessionSnapshot};

#[derive(Deserialize)]
pub struct GuessBody {
    pub elo: i32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCommand {
    Next,
    Previous,
    First,
    Last,
    Goto,
}

#[derive(Deserialize)]
pub struct MoveBody {
    pub action: MoveCommand,
    pub index: Option<usize>,
}

impl MoveBody {
    fn into_action(self) -> Result<Action, AppError> {
        Ok(match self.action {
            MoveCommand::Next => Action::NextMove,
            MoveCommand::Previous => Action::PreviousMove,
            MoveCommand::First => Action::FirstMove,
            MoveCommand::Last => Action::LastMove,
            MoveCommand::Goto => Action::GoToMove(
                self.index
                    .ok_or_else(|| AppError::BadRequest("goto requires an index".into()))?,
            ),
        })
    }
}

type Registry<S> = Extension<Arc<SessionRegistry<S>>>;

async fn run<S: GameSource>(
    session: &GameSession<Arc<S>>,
    action: Action,
) -> Result<Json<JsonValue>, AppError> {
    let dispatch: Dispatch = session.dispatch(action).await?;
    Ok(Json(json!({
        "dispatch": dispatch,
        "state": session.snapshot(),
    })))
}

/// GET /api/guess/state
pub async fn get_state<S: GameSource + 'static>(
    Extension(registry): Registry<S>,
    viewer: Viewer,
) -> Json<SessionSnapshot> {
    let session = registry.session(&viewer.session_key()).await;
    Json(session.snapshot())
}

/// GET /api/guess/events
pub async fn events<S: GameSource + 'static>(
    Extension(registry): Registry<S>,
    viewer: Viewer,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = registry.session(&viewer.session_key()).await;
    let mut rx = session.subscribe();
    let current = rx.borrow_and_update().clone();

    let stream = futures::stream::unfold((rx, Some(current)), |(mut rx, pending)| async move {
        let snapshot = match pending {
            Some(snapshot) => snapshot,
            None => {
                rx.changed().await.ok()?;
                rx.borrow_and_update().clone()
            }
        };
        Some((Ok::<_, Infallible>(snapshot_event(&snapshot)), (rx, None)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn snapshot_event(snapshot: &SessionSnapshot) -> Event {
    Event::default()
        .event("snapshot")
        .json_data(snapshot)
        .unwrap_or_else(|e| Event::default().comment(format!("unserializable snapshot: {e}")))
}

/// POST /api/guess/start
pub async fn start<S: GameSource + 'static>(
    Extension(registry): Registry<S>,
    viewer: Viewer,
) -> Result<Json<JsonValue>, AppError> {
    let session = registry.session(&viewer.session_key()).await;
    run(&session, Action::StartGuessing).await
}

/// POST /api/guess/guess
pub async fn submit_guess<S: GameSource + 'static>(
    Extension(registry): Registry<S>,
    viewer: Viewer,
    Json(body): Json<GuessBody>,
) -> Result<Json<JsonValue>, AppError> {
    let session = registry.session(&viewer.session_key()).await;
    run(&session, Action::SubmitGuess(body.elo)).await
}

/// POST /api/guess/next-game
pub async fn next_game<S: GameSource + 'static>(
    Extension(registry): Registry<S>,
    viewer: Viewer,
) -> Result<Json<JsonValue>, AppError> {
    let session = registry.session(&viewer.session_key()).await;
    run(&session, Action::NextGame).await
}

/// POST /api/guess/move
pub async fn navigate<S: GameSource + 'static>(
    Extension(registry): Registry<S>,
    viewer: Viewer,
    Json(body): Json<MoveBody>,
) -> Result<Json<JsonValue>, AppError> {
    let action = body.into_action()?;
    let session = registry.session(&viewer.session_key()).await;
    run(&session, action).await
}

/// POST /api/guess/flip
pub async fn flip<S: GameSource + 'static>(
    Extension(registry): Registry<S>,
    viewer: Viewer,
) -> Result<Json<JsonValue>, AppError> {
    let session = registry.session(&viewer.session_key()).await;
    run(&session, Action::FlipBoard).await
}
