//! FlowKV command-line tool
//!
//! One-shot operations against a data directory, plus `pipe`, which runs a
//! JSON-lines command stream from stdin through the command processor.

use std::io::{self, BufRead, Write};
use std::thread;

use clap::{Parser, Subcommand};
use crossbeam::channel;
use flowkv::config::WalSyncStrategy;
use flowkv::{CommandProcessor, Config, Database, Message, Result, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// FlowKV
#[derive(Parser, Debug)]
#[command(name = "flowkv")]
#[command(about = "Embedded ordered key-value store with live change feeds")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, env = "FLOWKV_DATA_DIR")]
    data_dir: Option<String>,

    /// MemTable size limit in MB before flush
    #[arg(short = 'm', long, default_value = "4")]
    memtable_mb: usize,

    /// fsync the WAL after every write
    #[arg(long)]
    sync_every_write: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the value stored at a key
    Get { key: String },

    /// Store a value (parsed as JSON, otherwise taken as a string)
    Put { key: String, value: String },

    /// Delete a key
    Del { key: String },

    /// List child segments under a prefix
    Keys {
        #[arg(default_value = "/")]
        prefix: String,
    },

    /// Print every entry under a prefix
    Range {
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Delete every key under a prefix
    Clear { prefix: String },

    /// Merge all SSTables into one
    Compact,

    /// Run JSON-lines commands from stdin, results to stdout
    Pipe {
        /// Print change events under this prefix to stderr (repeatable)
        #[arg(short, long)]
        watch: Vec<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flowkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder().memtable_size_limit(args.memtable_mb * 1024 * 1024);
    if let Some(dir) = &args.data_dir {
        builder = builder.data_dir(dir);
    }
    if args.sync_every_write {
        builder = builder.wal_sync_strategy(WalSyncStrategy::EveryWrite);
    }
    let config = builder.build()?;

    tracing::debug!("FlowKV v{} at {}", flowkv::VERSION, config.data_dir.display());
    let db = Database::open(&config)?;

    match args.command {
        Commands::Get { key } => match db.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("null"),
        },
        Commands::Put { key, value } => db.put(&key, Some(parse_value(&value)))?,
        Commands::Del { key } => db.delete(&key)?,
        Commands::Keys { prefix } => {
            for segment in db.keys(&prefix)? {
                println!("{}", segment);
            }
        }
        Commands::Range { prefix } => {
            for (key, value) in db.range(&prefix)? {
                println!("{} {}", key, value);
            }
        }
        Commands::Clear { prefix } => {
            let removed = db.clear(&prefix)?;
            println!("{}", removed);
        }
        Commands::Compact => match db.store().compact()? {
            Some(table) => println!("{} entries", table.entry_count()),
            None => println!("nothing to compact"),
        },
        Commands::Pipe { watch } => pipe(&db, watch)?,
    }

    Ok(())
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|json| Value::from_json(json).ok())
        .unwrap_or_else(|| Value::from(raw))
}

fn pipe(db: &Database, watch: Vec<String>) -> Result<()> {
    if !watch.is_empty() {
        let subscription = db.subscribe(watch);
        // Runs until the process exits
        thread::spawn(move || {
            for event in subscription.iter() {
                let value = event.value.map_or_else(|| "null".to_string(), |v| v.to_string());
                eprintln!("change {} {}", event.key, value);
            }
        });
    }

    let (input_tx, input_rx) = channel::bounded::<Message>(64);
    let (output_tx, output_rx) = channel::bounded::<Message>(64);

    let reader = thread::spawn(move || -> Result<()> {
        for line in io::stdin().lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if input_tx.send(Message::parse_line(&line)?).is_err() {
                break;
            }
        }
        Ok(())
    });

    let writer = thread::spawn(move || -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for message in output_rx.iter() {
            writeln!(out, "{}", message.to_json()?)?;
        }
        out.flush()?;
        Ok(())
    });

    let processor = CommandProcessor::new(db.clone());
    let outcome = processor.run(&input_rx, &output_tx);
    drop(output_tx);

    let written = writer.join().unwrap_or(Ok(()));
    // On failure the reader may still be blocked on stdin; leave it behind
    outcome?;
    written?;
    reader.join().unwrap_or(Ok(()))
}
