pub mod guess;
pub mod health;

use std::sync::Arc;

use axum::{routing::{get, post}, Extension, Router};

use crate::fetcher::GameSource;
use crate::session::SessionRegistry;

/// All routes, with the session registry attached.
pub fn router<S: GameSource + 'static>(registry: Arc<SessionRegistry<S>>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Guess the Elo
        .route("/api/guess/state", get(guess::get_state::<S>))
        .route("/api/guess/events", get(guess::events::<S>))
        .route("/api/guess/start", post(guess::start::<S>))
        .route("/api/guess/guess", post(guess::submit_guess::<S>))
        .route("/api/guess/next-game", post(guess::next_game::<S>))
        .route("/api/guess/move", post(guess::navigate::<S>))
        .route("/api/guess/flip", post(guess::flip::<S>))
        .layer(Extension(registry))
}
