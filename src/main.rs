//! Interview Notify - push notifications for IRC interview queues.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use interview_notify::analytics::{days_before, Aggregator, AnalyticsStore, InterviewRecord, Stats};
use interview_notify::config::{AppConfig, ConfigLoader, Mode, SourceConfig};
use interview_notify::display;
use interview_notify::notify::topic_url;
use interview_notify::pipeline::{shutdown_signal, Pipeline};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Red,
    Orp,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Red => Mode::Red,
            ModeArg::Orp => Mode::Orp,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "interview-notify",
    about = "Push notifications for IRC interview queues",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ./.interview-notify.toml, then the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch IRC logs and send notifications.
    Run(RunArgs),
    /// Show interview statistics.
    Stats {
        /// Statistics database.
        #[arg(long)]
        db: Option<PathBuf>,
        /// Size of the window in days.
        #[arg(long, default_value_t = 30)]
        days: u32,
        /// Only count one channel.
        #[arg(long)]
        channel: Option<String>,
        /// Number of recent interviews to list.
        #[arg(long, default_value_t = 15)]
        recent: usize,
        /// Print JSON instead of a report.
        #[arg(long)]
        json: bool,
    },
    /// Delete statistics older than the retention window.
    Prune {
        /// Statistics database.
        #[arg(long)]
        db: Option<PathBuf>,
        /// Keep this many days (default: analytics.retention_days).
        #[arg(long)]
        days: Option<u32>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// ntfy topic.
    #[arg(long)]
    topic: Option<String>,
    /// ntfy server URL.
    #[arg(long)]
    server: Option<String>,
    /// IRC log directory; repeat for several channels.
    #[arg(long = "log-dir")]
    log_dirs: Vec<PathBuf>,
    /// Your IRC nick.
    #[arg(long)]
    nick: Option<String>,
    /// Only accept announcements from bot nicks.
    #[arg(long, overrides_with = "no_check_bot_nicks")]
    check_bot_nicks: bool,
    /// Accept announcements from anyone.
    #[arg(long, overrides_with = "check_bot_nicks")]
    no_check_bot_nicks: bool,
    /// Comma-separated bot nicks.
    #[arg(long, value_delimiter = ',')]
    bot_nicks: Option<Vec<String>>,
    /// Announcement phrasing to recognise.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Append every notification to this file.
    #[arg(long)]
    notification_log: Option<PathBuf>,
    /// Seconds between non-critical notifications of the same kind.
    #[arg(long)]
    rate_limit: Option<u64>,
    /// Record interview statistics.
    #[arg(long)]
    enable_analytics: bool,
    /// Statistics database.
    #[arg(long)]
    analytics_db: Option<PathBuf>,
    /// Seconds without log activity before reporting a disconnect.
    #[arg(long)]
    silence_threshold: Option<u64>,
}

impl RunArgs {
    /// Apply flags on top of file configuration.
    fn apply(self, config: &mut AppConfig) {
        if let Some(topic) = self.topic {
            config.topic = topic;
        }
        if let Some(server) = self.server {
            config.server = server;
        }
        if !self.log_dirs.is_empty() {
            config.sources = self.log_dirs.into_iter().map(SourceConfig::new).collect();
        }
        if let Some(nick) = self.nick {
            config.nick = nick;
        }
        if self.check_bot_nicks {
            config.check_bot_nicks = true;
        }
        if self.no_check_bot_nicks {
            config.check_bot_nicks = false;
        }
        if let Some(bot_nicks) = self.bot_nicks {
            config.bot_nicks = bot_nicks;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(path) = self.notification_log {
            config.notification_log = Some(path);
        }
        if let Some(secs) = self.rate_limit {
            config.rate_limit_secs = secs;
        }
        if self.enable_analytics {
            config.analytics.enabled = true;
        }
        if let Some(path) = self.analytics_db {
            config.analytics.db_path = path;
        }
        if let Some(secs) = self.silence_threshold {
            config.silence_threshold_secs = Some(secs);
        }
    }
}

#[derive(Serialize)]
struct StatsReport {
    stats: Stats,
    recent: Vec<InterviewRecord>,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig, String> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    loader.load().map_err(|e| e.to_string())
}

async fn run(mut config: AppConfig, args: RunArgs) -> Result<(), String> {
    args.apply(&mut config);
    config.validate().map_err(|e| e.to_string())?;

    let pipeline = Pipeline::from_config(&config)
        .await
        .map_err(|e| e.to_string())?;
    let url = topic_url(&config.server, &config.topic).map_err(|e| e.to_string())?;
    display::print_watching(&pipeline.channels(), url.as_str());

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            tracing::error!(error = %e, "Signal handling unavailable");
            return;
        }
        signal_cancel.cancel();
    });

    let stats = pipeline.run(cancel).await.map_err(|e| e.to_string())?;
    tracing::info!(
        lines = stats.lines,
        events = stats.events,
        "Stopped"
    );
    Ok(())
}

async fn open_existing_store(path: &Path) -> Result<AnalyticsStore, String> {
    if !path.exists() {
        return Err(format!("no statistics database at {}", path.display()));
    }
    AnalyticsStore::open(path).await.map_err(|e| e.to_string())
}

async fn stats(
    config: &AppConfig,
    db: Option<PathBuf>,
    days: u32,
    channel: Option<String>,
    recent: usize,
    json: bool,
) -> Result<(), String> {
    let path = db.unwrap_or_else(|| config.analytics.db_path.clone());
    let store = open_existing_store(&path).await?;
    let since = days_before(Utc::now(), days).map_err(|e| e.to_string())?;

    let stats = store
        .stats(since, channel.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    let recent = store
        .recent_interviews(recent, channel.as_deref())
        .await
        .map_err(|e| e.to_string())?;

    if json {
        let report = StatsReport { stats, recent };
        let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        display::print_stats(&stats, days);
        display::print_recent(&recent);
    }
    Ok(())
}

async fn prune(config: &AppConfig, db: Option<PathBuf>, days: Option<u32>) -> Result<(), String> {
    let path = db.unwrap_or_else(|| config.analytics.db_path.clone());
    let days = days.unwrap_or(config.analytics.retention_days);
    let store = open_existing_store(&path).await?;
    let mut aggregator = Aggregator::new(store, config.analytics.pending_timeout())
        .await
        .map_err(|e| e.to_string())?;
    let report = aggregator
        .maintain(Utc::now(), days)
        .await
        .map_err(|e| e.to_string())?;
    display::print_pruned(report.pruned, days);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Run(args) => run(config, args).await,
        Commands::Stats {
            db,
            days,
            channel,
            recent,
            json,
        } => stats(&config, db, days, channel, recent, json).await,
        Commands::Prune { db, days } => prune(&config, db, days).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
