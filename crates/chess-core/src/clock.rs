//! Clock annotation handling for Chess.com PGNs.
//!
//! Chess.com embeds the remaining time after every half-move as a
//! `{[%clk 0:04:58.5]}` comment. The replay only needs the move text, so
//! comments are stripped and the clock readings kept aside in move order.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\{[^}]*\}").unwrap());

static CLK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[%clk\s+(\d+:\d{1,2}:\d{1,2}(?:\.\d+)?)\]").unwrap());

/// Shown when no clock reading exists for a seat.
pub const EMPTY_CLOCK: &str = "00:00";

/// A PGN with its comments removed and the clock readings pulled out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockExtraction {
    pub stripped_pgn: String,
    pub clock_times: Vec<String>,
}

/// Strip every `{...}` comment from `pgn`, collecting `%clk` readings.
///
/// Comments are matched single-level up to the first `}`. A comment without
/// a well-formed `%clk` directive is still removed but yields no reading.
pub fn extract_clock_times(pgn: &str) -> ClockExtraction {
    let mut clock_times = Vec::new();

    let lines: Vec<String> = pgn
        .lines()
        .map(|line| {
            for comment in COMMENT_RE.find_iter(line) {
                if let Some(cap) = CLK_RE.captures(comment.as_str()) {
                    clock_times.push(cap[1].to_string());
                }
            }
            COMMENT_RE.replace_all(line, "").trim_end().to_string()
        })
        .collect();

    ClockExtraction {
        stripped_pgn: lines.join("\n"),
        clock_times,
    }
}

/// Parse a clock reading such as `0:04:58` or `0:04:58.5`.
pub fn parse_clock(clock: &str) -> Option<Duration> {
    let mut parts = clock.trim().split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    let whole = hours * 3600 + minutes * 60;
    Some(Duration::from_secs(whole) + Duration::from_secs_f64(seconds))
}

/// Format a remaining time the way a board clock shows it:
/// `M:SS` under an hour, `H:MM:SS` otherwise.
pub fn format_clock(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
