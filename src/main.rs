//! chanroster - reads raw IRC lines from stdin and keeps a live roster.
//!
//! Stand-in for a real bot transport: point a client's raw log at it to
//! watch membership being reconstructed.

use anyhow::Context;
use chanroster::config::{Config, LogConfig};
use chanroster::{
    MemorySettings, Roster, RosterEvent, RosterHandle, SettingsStore, SqliteSettings, decode_line,
    telemetry,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "chanroster.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            telemetry::init(&LogConfig::default());
            error!(path = %config_path, error = %e, "Failed to load config");
            return Err(e.into());
        }
    };
    telemetry::init(&config.log);

    let strategy = config
        .users
        .strategy()
        .context("users.identify_by passed validation but does not parse")?;

    let settings: Arc<dyn SettingsStore> = match config.database {
        Some(ref db) => Arc::new(
            SqliteSettings::open(&db.path)
                .await
                .with_context(|| format!("opening settings database {}", db.path))?,
        ),
        None => {
            info!("No database configured. Settings are kept in memory.");
            Arc::new(MemorySettings::new())
        }
    };

    info!(
        nick = %config.bot.nick,
        identify_by = %strategy,
        casemapping = ?config.users.casemapping,
        "Starting chanroster"
    );

    let roster = Roster::new(
        config.bot.nick.clone(),
        strategy,
        config.users.casemapping,
        settings,
    );
    let handle = RosterHandle::spawn(roster, config.limits.event_queue);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        match decode_line(&line) {
            Ok(Some(event)) => handle.send(event).await?,
            Ok(None) => {}
            Err(e) => warn!(code = e.error_code(), error = %e, line = %line, "Undecodable line"),
        }
    }

    handle.sync().await?;
    let (channels, users) =
        handle.with_roster(|roster| (roster.channels().count(), roster.user_count()));
    info!(channels, users, "Input closed");

    // End of input is the transport going away.
    handle.send(RosterEvent::ConnectionLost).await?;
    handle.shutdown().await;

    Ok(())
}
