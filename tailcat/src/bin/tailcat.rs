use clap::Parser;
use eyre::{Context, Result};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, sleep};
use std::time::{Duration, Instant};
use tailcat::config::Config;
use tailer::{Cursor, CursorError, FileSource, ListenerError, SourceError};

#[derive(Parser)]
#[command(name = "tailcat")]
#[command(about = "follow a growing text file and print new lines")]
struct Args {
    #[arg(help = "configuration file path (toml format)")]
    config: String,

    #[arg(
        short,
        long,
        value_parser = humantime::parse_duration,
        help = "stop following after this long (e.g. 10s, 5m, 1h)"
    )]
    follow_for: Option<Duration>,

    #[arg(
        short,
        long,
        default_value_t = 1,
        help = "number of threads pulling lines from the cursor"
    )]
    consumers: usize,

    #[arg(long, help = "print lines from the reader thread instead of pulling")]
    push: bool,
}

fn print_line(line: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", line)
}

fn consume(cursor: &Cursor<FileSource>, index: usize, prefixed: bool) -> usize {
    let mut count = 0;
    loop {
        let line = match cursor.next() {
            Ok(line) => line,
            Err(CursorError::Cancelled) => break,
            Err(e) => {
                tracing::warn!(consumer = index, error = %e, "consumer failed");
                break;
            }
        };
        let printed = if prefixed {
            print_line(&format!("[{}] {}", index, line))
        } else {
            print_line(&line)
        };
        if let Err(e) = printed {
            tracing::warn!(consumer = index, error = %e, "failed to write line");
            break;
        }
        count += 1;
    }
    count
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    eyre::ensure!(args.consumers > 0, "at least one consumer is required");

    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load config path={}", args.config))?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        tracing::info!("received ctrl+c, shutting down gracefully...");
        r.store(false, Ordering::SeqCst);
    })?;

    let report = |e: &SourceError| tracing::warn!(error = %e, "source failure, retrying");
    let mut builder =
        Cursor::builder(config.source.build(), config.cursor).error_listener(report);
    if args.push {
        builder = builder.item_listener(|line: String| -> Result<(), ListenerError> {
            print_line(&line).map_err(ListenerError::new)
        });
    }
    let cursor = Arc::new(
        builder
            .build()
            .with_context(|| format!("failed to open {}", config.source.path.display()))?,
    );
    cursor.start()?;
    tracing::info!(path = %config.source.path.display(), push = args.push, "following");

    let consumers: Vec<_> = if args.push {
        Vec::new()
    } else {
        let prefixed = args.consumers > 1;
        (0..args.consumers)
            .map(|index| {
                let cursor = cursor.clone();
                thread::Builder::new()
                    .name(format!("consumer-{}", index))
                    .spawn(move || consume(&cursor, index, prefixed))
            })
            .collect::<io::Result<_>>()?
    };

    let start_time = Instant::now();
    let follow_for = args.follow_for;
    while running.load(Ordering::SeqCst) && follow_for.is_none_or(|d| start_time.elapsed() < d) {
        sleep(Duration::from_millis(10));
    }

    cursor.stop()?;

    let mut printed = 0;
    for handle in consumers {
        match handle.join() {
            Ok(count) => printed += count,
            Err(_) => tracing::warn!("consumer thread panicked"),
        }
    }

    tracing::info!(lines = printed, "done following");
    Ok(())
}
