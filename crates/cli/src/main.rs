use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use typeahead_core::{InputDebouncer, SearchConfig, SearchSession, SessionStatus};

use crate::line::{parse_line, Line};
use crate::output::PrintListener;

mod line;
mod output;
mod words;

type Session = SearchSession<String, std::io::Error>;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "typeahead")]
#[command(about = "Search-as-you-type over a word list, driven from stdin", long_about = None)]
#[command(version)]
struct Cli {
    /// Word list to search (one entry per line)
    #[arg(long)]
    words: PathBuf,

    /// Search config file (JSON or TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum input length before a search is issued
    #[arg(long)]
    min_len: Option<usize>,

    /// Quiet period before a text change is searched (ms)
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Artificial lookup latency (ms), useful to watch stale results get dropped
    #[arg(long, default_value_t = 0)]
    lookup_delay_ms: u64,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = resolve_config(&cli)?;
    debug!("search config: {config:?}");

    tokio::fs::metadata(&cli.words)
        .await
        .with_context(|| format!("cannot read word list {}", cli.words.display()))?;
    let lookup = words::word_lookup(
        cli.words.clone(),
        Duration::from_millis(cli.lookup_delay_ms),
    );

    let session: Session = SearchSession::start(Arc::new(PrintListener::new(cli.json)));
    let input = InputDebouncer::start(session.clone(), lookup, config)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(raw) = lines.next_line().await.context("failed to read stdin")? {
        match parse_line(&raw) {
            Ok(Line::Quit) => break,
            Ok(line) => apply(line, &session, &input).await?,
            Err(err) => warn!("{err}"),
        }
    }

    input.flush().await?;
    wait_until_settled(&session).await?;
    input.shutdown();
    session.shutdown();
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<SearchConfig> {
    let mut config = match &cli.config {
        Some(path) => SearchConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if let Some(min_len) = cli.min_len {
        config = config.with_min_query_len(min_len);
    }
    if let Some(ms) = cli.debounce_ms {
        config = config.with_debounce(Duration::from_millis(ms));
    }
    config.validate()?;
    Ok(config)
}

async fn apply(line: Line, session: &Session, input: &InputDebouncer) -> Result<()> {
    match line {
        Line::Text(text) => input.text_changed(text)?,
        Line::Filter(needle) => {
            let needle = needle.to_lowercase();
            session.filter_list(move |word: &String| word.to_lowercase().contains(&needle))?;
        }
        Line::Sort(key) => session.sort_list(move |a: &String, b: &String| key.compare(a, b))?,
        Line::Unfilter => session.remove_filter()?,
        Line::Unsort => session.remove_sort()?,
        Line::Replay => session.replay_last_search()?,
        Line::Flush => input.flush().await?,
        Line::Quit => {}
    }
    Ok(())
}

/// Block until no search is in flight, so every result has been printed.
async fn wait_until_settled(session: &Session) -> Result<()> {
    // Everything sent so far (including a just-flushed search) is applied
    // once the snapshot comes back.
    session.snapshot().await?;

    let mut status = session.status_stream();
    tokio::time::timeout(SETTLE_TIMEOUT, async {
        loop {
            if !matches!(*status.borrow_and_update(), SessionStatus::Loading { .. }) {
                break;
            }
            if status.changed().await.is_err() {
                break;
            }
        }
    })
    .await
    .context("timed out waiting for the last search to finish")?;

    session.snapshot().await?;
    Ok(())
}
