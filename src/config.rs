//! Configuration management.
//!
//! Loads settings from environment variables and .env file.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::data::models::GameId;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Settings {
    // NHL endpoints
    pub api_base_url: String,
    pub stats_base_url: String,
    pub reports_base_url: String,

    // HTTP
    pub http_rate_limit: u32,
    pub http_max_retries: u32,
    pub http_timeout_seconds: u64,

    // Ingest
    pub max_concurrent_games: usize,
    pub start_date: String,
    pub end_date: String,
    pub only_reg_season: bool,
    /// Explicit game ids; when set the schedule is not consulted.
    pub game_ids: Vec<String>,

    // Backup output
    pub backup_out_path: PathBuf,
    pub fresh_backup: bool,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

impl Settings {
    /// Load settings from environment variables (and .env file).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let start_date = env_str("START_DATE", "");
        Self {
            api_base_url: env_str("NHL_API_BASE_URL", "https://api-web.nhle.com/v1"),
            stats_base_url: env_str("NHL_STATS_BASE_URL", "https://api.nhle.com/stats/rest/en"),
            reports_base_url: env_str(
                "NHL_REPORTS_BASE_URL",
                "https://www.nhl.com/scores/htmlreports",
            ),

            http_rate_limit: env_u32("HTTP_RATE_LIMIT", 10),
            http_max_retries: env_u32("HTTP_MAX_RETRIES", 3),
            http_timeout_seconds: env_u64("HTTP_TIMEOUT_SECONDS", 30),

            max_concurrent_games: env_usize("MAX_CONCURRENT_GAMES", 4),
            end_date: env_str("END_DATE", &start_date),
            start_date,
            only_reg_season: env_bool("ONLY_REG_SEASON", true),
            game_ids: env_csv("GAME_IDS"),

            backup_out_path: PathBuf::from(env_str("BACKUP_OUT_PATH", "./backup")),
            fresh_backup: env_bool("FRESH_BACKUP", true),

            log_level: env_str("LOG_LEVEL", "info"),
            log_json: env_bool("LOG_JSON", false),
        }
    }

    /// Inclusive date range to ingest, if both ends parse.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::parse_from_str(&self.start_date, DATE_FORMAT).ok()?;
        let end = NaiveDate::parse_from_str(&self.end_date, DATE_FORMAT).ok()?;
        Some((start, end))
    }

    /// Parsed `GAME_IDS`; entries that do not parse are dropped.
    pub fn explicit_game_ids(&self) -> Vec<GameId> {
        self.game_ids.iter().filter_map(|s| s.parse().ok()).collect()
    }

    /// Validate configuration for critical requirements.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (key, url) in [
            ("NHL_API_BASE_URL", &self.api_base_url),
            ("NHL_STATS_BASE_URL", &self.stats_base_url),
            ("NHL_REPORTS_BASE_URL", &self.reports_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(format!("{key} must be an http(s) URL"));
            }
        }

        if self.http_rate_limit == 0 {
            errors.push("HTTP_RATE_LIMIT must be at least 1".to_string());
        }
        if self.http_max_retries == 0 {
            errors.push("HTTP_MAX_RETRIES must be at least 1".to_string());
        }
        if self.max_concurrent_games == 0 {
            errors.push("MAX_CONCURRENT_GAMES must be at least 1".to_string());
        }

        if self.game_ids.is_empty() {
            let start = NaiveDate::parse_from_str(&self.start_date, DATE_FORMAT);
            let end = NaiveDate::parse_from_str(&self.end_date, DATE_FORMAT);
            if start.is_err() {
                errors.push("START_DATE must be set as yyyy-mm-dd (or set GAME_IDS)".to_string());
            }
            if end.is_err() {
                errors.push("END_DATE must be yyyy-mm-dd".to_string());
            }
            if let (Ok(start), Ok(end)) = (start, end) {
                if end < start {
                    errors.push("END_DATE must not be before START_DATE".to_string());
                }
            }
        } else {
            for id in &self.game_ids {
                if id.parse::<GameId>().is_err() {
                    errors.push(format!("GAME_IDS entry {id:?} is not a game id"));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_csv(key: &str) -> Vec<String> {
    std::env::var(key)
        .ok()
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
