//! Picket CLI - watch a directory tree and print file change events
//!
//! Thin wiring around [`picket_watcher::Watcher`]: pick a directory,
//! optionally narrow it down by extension, and stream events to stdout
//! until Ctrl-C.

use clap::Parser;
use colored::Colorize;
use picket_core::FileEvent;
use picket_watcher::Watcher;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "picket")]
#[command(author = "Picket Contributors")]
#[command(version)]
#[command(about = "Watch a directory tree and print file change events", long_about = None)]
struct Cli {
    /// Directory to watch (defaults to the current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Only report files with this extension; repeatable, e.g. `-e js -e md`
    #[arg(short = 'e', long = "ext")]
    extensions: Vec<String>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let extensions: Vec<&str> = cli.extensions.iter().map(String::as_str).collect();
    let mut watcher = Watcher::new(&cli.path, &extensions)?;
    let mut events = watcher.watch()?;

    println!("{} {}", "Watching".cyan(), watcher.root().display());

    // Ctrl-C closes the watcher; the stream drains and then ends.
    let handle = watcher.close_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.close();
        }
    });

    while let Some(event) = events.recv().await {
        print_event(&event, cli.json)?;
    }

    println!("{}", "Stopped".cyan());
    Ok(())
}

fn print_event(event: &FileEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        println!(
            "{:>9} {}",
            event.op.to_string().green(),
            event.path.display()
        );
    }
    Ok(())
}
