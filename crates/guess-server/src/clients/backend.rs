use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

/// Only the rapid indicator decides eligibility; other time classes are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ratings {
    #[serde(default)]
    pub rapid: Option<i64>,
}

/// A community member handed out by `/random-player`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomPlayer {
    pub chess_username: String,
    #[serde(default)]
    pub ratings: Ratings,
}

/// Client for the community backend.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("GuessTheElo/1.0")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn random_player(&self) -> Result<RandomPlayer, String> {
        let url = format!("{}/random-player", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Random player request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("Random player HTTP {}", resp.status()));
        }

        resp.json()
            .await
            .map_err(|e| format!("Random player JSON parse error: {e}"))
    }
}
