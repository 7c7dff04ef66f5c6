use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ArchivesResponse {
    #[serde(default)]
    archives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MonthResponse {
    #[serde(default)]
    games: Vec<ArchivedGame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchivedPlayer {
    pub username: String,
    #[serde(default)]
    pub rating: i32,
}

/// One entry of a monthly archive, reduced to the fields the game picker reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchivedGame {
    #[serde(default = "default_rules")]
    pub rules: String,
    #[serde(default)]
    pub time_class: String,
    #[serde(default)]
    pub pgn: String,
    pub white: ArchivedPlayer,
    pub black: ArchivedPlayer,
    #[serde(default)]
    pub url: String,
}

fn default_rules() -> String {
    "chess".to_string()
}

pub struct ChessComClient {
    client: Client,
    base_url: String,
}

impl ChessComClient {
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

    /// Fetch the list of monthly archive URLs for a player, oldest first.
    pub async fn fetch_archives(&self, username: &str) -> Result<Vec<String>, String> {
        let url = format!("{}/player/{}/games/archives", self.base_url, username);

        tokio::time::sleep(Duration::from_millis(100)).await;

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Archives request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("Archives HTTP {}", resp.status()));
        }

        let data: ArchivesResponse = resp
            .json()
            .await
            .map_err(|e| format!("Archives JSON parse error: {e}"))?;

        Ok(data.archives)
    }

    /// Fetch every game in one monthly archive.
    pub async fn fetch_month(&self, archive_url: &str) -> Result<Vec<ArchivedGame>, String> {
        // Rate limit
        tokio::time::sleep(Duration::from_millis(100)).await;

        let resp = self
            .client
            .get(archive_url)
            .send()
            .await
            .map_err(|e| format!("Request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }

        let data: MonthResponse = resp
            .json()
            .await
            .map_err(|e| format!("JSON parse error: {e}"))?;

        Ok(data.games)
    }
}

/// Year of an archive URL such as `.../games/2024/03`.
pub fn archive_year(url: &str) -> Option<i32> {
    let mut parts = url.trim_end_matches('/').rsplit('/');
    let _month: u32 = parts.next()?.parse().ok()?;
    parts.next()?.parse().ok()
}
