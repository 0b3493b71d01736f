//! Extraction host: opens an archive, runs the pipeline and writes
//! JSON-lines batches, with progress on stdout and a per-type summary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;

use starforge_extract::{
    ExtractOptions, Phase, Progress, RowSink, Session,
};
use starforge_p4k::P4kArchive;

#[derive(Parser)]
#[command(
    name = "starforge",
    about = "Extract ships, components, shops and items from a game content archive",
    version
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List archive entries, optionally filtered by a path substring
    Entries {
        /// Path to the archive
        archive: PathBuf,

        /// Case-insensitive path substring filter
        filter: Option<String>,
    },

    /// Run the extraction pipeline and write JSON-lines tables
    Extract {
        /// Path to the archive
        archive: PathBuf,

        /// Output directory for <table>.jsonl files
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// Depth bound for nested instance reads
        #[arg(long, default_value_t = 3)]
        max_depth: usize,

        /// Per-property array element cap
        #[arg(long, default_value_t = 200)]
        array_cap: usize,
    },
}

/// Writes each table as `<dir>/<table>.jsonl`.
struct JsonlSink {
    dir: PathBuf,
}

impl RowSink for JsonlSink {
    fn upsert_batch(&mut self, table: &str, rows: &[serde_json::Value]) -> Result<(), String> {
        let path = self.dir.join(format!("{table}.jsonl"));
        let file = File::create(&path).map_err(|e| format!("{}: {e}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for row in rows {
            serde_json::to_writer(&mut writer, row).map_err(|e| e.to_string())?;
            writer.write_all(b"\n").map_err(|e| e.to_string())?;
        }
        writer.flush().map_err(|e| e.to_string())
    }
}

fn progress_line(progress: Progress) {
    match progress.phase {
        Phase::Directory => {
            println!("  directory scan: {}/{} entries", progress.done, progress.total);
        }
        phase => {
            if progress.total > 0 {
                println!("  {}: {}/{}", phase.label(), progress.done, progress.total);
            } else {
                println!("  {}: {}", phase.label(), progress.done);
            }
        }
    }
}

fn run_extract(
    archive: PathBuf,
    output: PathBuf,
    max_depth: usize,
    array_cap: usize,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(&output)
        .with_context(|| format!("creating {}", output.display()))?;

    let options = ExtractOptions {
        max_instance_depth: max_depth,
        array_element_cap: array_cap,
        progress: Some(Box::new(progress_line)),
        ..ExtractOptions::default()
    };

    println!("opening {}", archive.display());
    let mut session = Session::open(&archive, options)?;
    session.load_database()?;

    let mut sink = JsonlSink { dir: output };
    session.extract_all(&mut sink)?;

    println!("\nextraction summary:");
    for (table, count) in session.phase_counts() {
        println!("  {table:<14} {count:>8}");
    }
    Ok(())
}

fn run_entries(archive: PathBuf, filter: Option<String>) -> anyhow::Result<()> {
    let mut archive = P4kArchive::open(&archive)?;
    archive.load_all(None)?;

    let needle = filter.map(|f| f.to_lowercase());
    let mut shown = 0u64;
    for entry in archive.entries() {
        if let Some(needle) = &needle {
            if !entry.path.to_lowercase().contains(needle) {
                continue;
            }
        }
        println!("{:>12}  {}", entry.uncompressed_size, entry.path);
        shown += 1;
    }
    println!("{shown} of {} entries", archive.entry_count());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(Level::from(cli.log_level).into())
                .from_env_lossy(),
        )
        .init();

    match cli.command {
        Commands::Entries { archive, filter } => run_entries(archive, filter),
        Commands::Extract {
            archive,
            output,
            max_depth,
            array_cap,
        } => run_extract(archive, output, max_depth, array_cap),
    }
}
