mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sketch_pad_config::EngineConfig;
use sketch_pad_core::{Editor, Path};

use crate::script::Session;

/// Replays a script of editor commands and prints the resulting document.
#[derive(Parser, Debug)]
#[command(name = "sketch-pad", version, about)]
struct Cli {
    /// JSON file holding an array of commands. Reads stdin when omitted.
    script: Option<PathBuf>,

    /// Configuration file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every change notification.
    #[arg(long = "trace-changes")]
    trace_changes: bool,

    /// Print the undo stack after the document.
    #[arg(long)]
    history: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the document
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(EngineConfig::config_path);
    let config = EngineConfig::load_or_create(&config_path);
    tracing::info!("Starting sketch-pad with config {}", config_path.display());

    let mut editor = Editor::new(config).context("Failed to create the editor")?;
    if cli.trace_changes {
        editor.listen(Path::Root, |changed, _| tracing::info!("changed: {changed}"));
    }

    let commands = script::read_script(cli.script.as_deref())?;
    let mut session = Session::new(editor);
    session.execute_all(commands)?;

    let document = session.editor().document()?;
    let json = serde_json::to_string_pretty(&document).context("Failed to serialize the document")?;
    println!("{json}");

    if cli.history {
        print_history(session.editor());
    }
    Ok(())
}

/// One line per undoable entry, most recent first.
fn print_history(editor: &Editor) {
    println!("undo stack ({} entries):", editor.history().undo_count());
    for batch in editor.history().undo_batches() {
        let paths: Vec<String> = batch.paths().iter().map(|p| p.to_string()).collect();
        println!(
            "  #{} {} {} record(s): {}",
            batch.seq,
            batch.committed_at.format("%H:%M:%S%.3f"),
            batch.len(),
            paths.join(", ")
        );
    }
}
