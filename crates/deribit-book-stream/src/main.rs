/*
[INPUT]:  CLI arguments, optional YAML configuration file, instrument on stdin, OS shutdown signals
[OUTPUT]: Order book messages on stdout, diagnostics on stderr
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use deribit_book_adapter::{BookSession, ConsoleSink, SubscriptionRequest};
use deribit_book_stream::config::validate_instrument;
use deribit_book_stream::prompt::prompt_instrument;
use deribit_book_stream::{Overrides, StreamConfig};

#[derive(Parser, Debug)]
#[command(name = "deribit-book-stream", version, about = "Deribit order book WebSocket stream")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    /// Instrument to subscribe to; prompted for when omitted
    #[arg(long, value_name = "NAME")]
    instrument: Option<String>,
    #[arg(long, value_name = "HOST")]
    host: Option<String>,
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
    /// Connect to the public test venue
    #[arg(long)]
    testnet: bool,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Also write logs to this file
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Validate configuration, print the subscription and exit
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_file.as_deref())?;

    let mut config = match &args.config_path {
        Some(path) => StreamConfig::from_file(path).context("load config")?,
        None => StreamConfig::default(),
    };
    config.apply(Overrides {
        instrument: args.instrument,
        host: args.host,
        port: args.port,
        testnet: args.testnet,
    });
    config
        .session
        .validate()
        .context("validate session config")?;

    let instrument = match config.instrument.as_deref() {
        Some(raw) => validate_instrument(raw)?,
        None => prompt_instrument()?,
    };

    info!(
        host = %config.session.host,
        port = config.session.port,
        path = %config.session.path,
        instrument = %instrument,
        dry_run = args.dry_run,
        "starting deribit-book-stream"
    );

    if args.dry_run {
        let subscription = SubscriptionRequest::order_book(&instrument)
            .encode()
            .context("encode subscription")?;
        println!("{subscription}");
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let session = BookSession::new(config.session, instrument, ConsoleSink::new());
    tokio::select! {
        err = session.run() => {
            info!(stage = %err.stage(), "session ended");
        }
        _ = shutdown.cancelled() => {
            info!("shutdown signal received; session abandoned");
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .context("log file path must name a file")?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // stdout carries the feed, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
