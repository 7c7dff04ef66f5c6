use std::env;
use std::ops::RangeInclusive;

/// Community members who play often enough to skip the rating check.
pub const DEFAULT_FREQUENT_USERS: &[&str] = &[
    "BMTech",
    "Sir_Ragez",
    "PawnStormPete",
    "KnightRiderBM",
    "queenside_quinn",
    "EndgameEddie",
];

#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub chess_com_api_url: String,
    pub host: String,
    pub port: u16,
    pub http_timeout_secs: u64,
    pub session_idle_ttl_secs: u64,
    pub max_sessions: usize,
    pub fetch: FetchSettings,
}

impl Config {
    pub fn from_env() -> Self {
        let mut fetch = FetchSettings::default();
        if let Ok(users) = env::var("FREQUENT_USERS") {
            let users: Vec<String> = users
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !users.is_empty() {
                fetch.frequent_users = users;
            }
        }

        Self {
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            chess_com_api_url: env::var("CHESS_COM_API_URL")
                .unwrap_or_else(|_| "https://api.chess.com/pub".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            session_idle_ttl_secs: env::var("SESSION_IDLE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1800),
            max_sessions: env::var("MAX_SESSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            fetch,
        }
    }
}

/// Knobs for picking a random game.
#[derive(Clone, Debug)]
pub struct FetchSettings {
    pub frequent_users: Vec<String>,
    /// Chance of drawing from `frequent_users` instead of asking the backend.
    pub frequent_user_probability: f64,
    /// Minimum rapid indicator a backend-supplied player needs.
    pub min_rapid_rating: i64,
    pub archive_years: RangeInclusive<i32>,
    /// Archive picks per candidate before giving up.
    pub max_game_attempts: usize,
    /// Backend candidates tried while they lack rapid history.
    pub max_candidate_attempts: usize,
    pub rules: String,
    pub time_class: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            frequent_users: DEFAULT_FREQUENT_USERS.iter().map(|s| s.to_string()).collect(),
            frequent_user_probability: 0.3,
            min_rapid_rating: 10,
            archive_years: 2022..=2024,
            max_game_attempts: 10,
            max_candidate_attempts: 10,
            rules: "chess".to_string(),
            time_class: "rapid".to_string(),
        }
    }
}
