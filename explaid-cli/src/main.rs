use anyhow::{Context, Result};
use clap::Parser;
use explaid::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "explaid")]
#[command(about = "Explains why an answer set program has no answer set")]
#[command(version)]
struct Cli {
    /// Logic program files; standard input when none are given
    files: Vec<PathBuf>,

    /// Language model to ask (gpt-4o, gpt-4o-mini)
    #[arg(long)]
    model: Option<ModelTag>,

    /// Path to the clingo executable
    #[arg(long)]
    clingo: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli) {
        Ok(status) => ExitCode::from(status.code()),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(ExitStatus::Failure.code())
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<ExitStatus> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let status = runtime.block_on(async move {
        let app = match build_app(&cli) {
            Ok(app) => app,
            Err(e) => return report(&e),
        };

        let token = app.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel("interrupted");
            }
        });

        match app.run(&cli.files).await {
            Ok(_) => ExitStatus::Success,
            Err(e) => report(&e),
        }
    });
    Ok(status)
}

fn build_app(cli: &Cli) -> Result<ExplainApp, ExplaidError> {
    let mut config = AppConfig::from_env()?;
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(clingo) = &cli.clingo {
        config = config.with_clingo_path(clingo.clone());
    }
    let events: Arc<dyn EventSink> = Arc::new(LoggingEventSink::debug());
    Ok(ExplainApp::from_config(config, Terminal::stdout())?.with_event_sink(events))
}

fn report(err: &ExplaidError) -> ExitStatus {
    let status = ExitStatus::for_error(err);
    tracing::debug!(stage = err.stage_label(), code = status.code(), "run failed");
    eprintln!("error: {err}");
    status
}
