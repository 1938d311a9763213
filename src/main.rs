//! NHL play-by-play ingester.
//!
//! Looks up the games of a date range (or an explicit `GAME_IDS` list),
//! parses the game-center feed, the HTML report and the shift chart of each
//! game, and appends the projected rows to JSON Lines backup tables.

use std::sync::Arc;
use tracing::{error, info, warn};

use nhl_pbp::api::client::NhlClient;
use nhl_pbp::config::Settings;
use nhl_pbp::data::rows::TableKind;
use nhl_pbp::ingest::{Ingestor, JsonLinesSink, NhlSource, RowSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();

    init_logging(&settings);

    info!("=== NHL play-by-play ingest ===");
    info!(
        api_base = %settings.api_base_url,
        start_date = %settings.start_date,
        end_date = %settings.end_date,
        only_reg_season = settings.only_reg_season,
        backup = %settings.backup_out_path.display(),
        "Configuration loaded"
    );

    if let Err(errors) = settings.validate() {
        for e in &errors {
            error!(error = %e, "Configuration error");
        }
        anyhow::bail!("Configuration validation failed");
    }

    let client = NhlClient::new(
        settings.http_rate_limit,
        settings.http_max_retries,
        settings.http_timeout_seconds,
    )?;
    let source = NhlSource::new(Arc::new(client), &settings);
    let ingestor = Ingestor::new(
        source,
        settings.max_concurrent_games,
        settings.only_reg_season,
    );

    let mut sink = if settings.fresh_backup {
        JsonLinesSink::fresh(&settings.backup_out_path)?
    } else {
        JsonLinesSink::open(&settings.backup_out_path)?
    };

    let summary = if settings.game_ids.is_empty() {
        let Some((start, end)) = settings.date_range() else {
            anyhow::bail!("START_DATE/END_DATE did not parse");
        };
        ingestor.run_range(start, end, &mut sink).await?
    } else {
        let ids = settings.explicit_game_ids();
        info!(games = ids.len(), "Using configured GAME_IDS");
        ingestor.run_games(ids, &mut sink).await?
    };
    sink.flush()?;

    for table in TableKind::ALL {
        info!(
            table = table.name(),
            rows = sink.written(table),
            path = %sink.path_of(table).display(),
            "Backup table written"
        );
    }

    if summary.is_clean() {
        info!(dates = summary.dates, games = summary.games, "Ingest complete");
    } else {
        warn!(
            dates = summary.dates,
            games = summary.games,
            schedule_failures = summary.schedule_failures,
            json_failures = summary.json_failures,
            html_failures = summary.html_failures,
            shift_failures = summary.shift_failures,
            aborted_games = summary.aborted_games,
            "Ingest complete with failures"
        );
    }

    Ok(())
}

fn init_logging(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}
