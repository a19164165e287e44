//! HamArc CLI - Hamming-coded archives
//!
//! Stores files in a single HAM archive with every byte protected by a
//! per-chunk Hamming code, so bit rot is detected on extraction.

mod commands;
mod utils;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    cmd_append, cmd_concat, cmd_create, cmd_delete, cmd_extract, cmd_list, cmd_test,
};
use hamarc_archive::{
    ArchiveOptions, CorruptionPolicy, DEFAULT_BYTES_PER_CHUNK, DEFAULT_SLACK_RESTOCK,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hamarc")]
#[command(author, version, about = "Hamming-coded single-file archiver")]
#[command(long_about = "
HamArc stores files in a single HAM archive. Every stored byte is covered
by a Hamming code applied chunk by chunk, so a flipped bit is detected
when the file is extracted.

Examples:
  hamarc create backup.ham notes.txt photo.jpg
  hamarc append backup.ham todo.txt
  hamarc list backup.ham
  hamarc extract backup.ham notes.txt -o restored
  hamarc delete backup.ham photo.jpg
  hamarc concat all.ham backup.ham other.ham
  hamarc test backup.ham
")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new archive, replacing any existing file
    #[command(alias = "c")]
    Create {
        /// Archive file to create
        archive: PathBuf,

        /// Files to add to the archive
        files: Vec<PathBuf>,

        /// Plaintext bytes per Hamming chunk
        #[arg(short = 'C', long, default_value_t = DEFAULT_BYTES_PER_CHUNK)]
        chunk_size: usize,

        /// Free table slots to reserve whenever the table grows
        #[arg(long, default_value_t = DEFAULT_SLACK_RESTOCK)]
        slack: u64,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Add files to an archive, creating it if needed
    #[command(alias = "a")]
    Append {
        /// Archive file to add to
        archive: PathBuf,

        /// Files to add
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Chunk size used if the archive has to be created
        #[arg(short = 'C', long, default_value_t = DEFAULT_BYTES_PER_CHUNK)]
        chunk_size: usize,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Extract files from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Files to extract (all if empty)
        files: Vec<String>,

        /// Output directory [default: ./extract_dir_<archive>]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail a file on the first corrupted chunk instead of zero-filling it
        #[arg(long)]
        strict: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Delete files from an archive, keeping a raw backup of each
    #[command(alias = "d")]
    Delete {
        /// Archive file to modify
        archive: PathBuf,

        /// Files to delete
        #[arg(required = true)]
        files: Vec<String>,

        /// Backup directory [default: ./delete_dir_<archive>]
        #[arg(short, long)]
        backup_dir: Option<PathBuf>,
    },

    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show sizes and offsets
        #[arg(short, long)]
        long: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Merge archives into one
    Concat {
        /// Destination archive (created if missing)
        dest: PathBuf,

        /// Archives to merge into the destination
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Chunk size used if the destination has to be created
        #[arg(short = 'C', long, default_value_t = DEFAULT_BYTES_PER_CHUNK)]
        chunk_size: usize,

        /// Skip a source file on the first corrupted chunk
        #[arg(long)]
        strict: bool,
    },

    /// Check every chunk of every file without extracting
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn policy(strict: bool) -> CorruptionPolicy {
    if strict {
        CorruptionPolicy::Fail
    } else {
        CorruptionPolicy::Skip
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "hamarc starting");

    let result = match cli.command {
        Commands::Create {
            archive,
            files,
            chunk_size,
            slack,
            progress,
        } => {
            let options = ArchiveOptions::new()
                .with_chunk_size(chunk_size)
                .with_slack_restock(slack);
            cmd_create(&archive, &files, options, progress)
        }
        Commands::Append {
            archive,
            files,
            chunk_size,
            progress,
        } => cmd_append(
            &archive,
            &files,
            ArchiveOptions::new().with_chunk_size(chunk_size),
            progress,
        ),
        Commands::Extract {
            archive,
            files,
            output,
            strict,
            progress,
        } => cmd_extract(&archive, &files, output, policy(strict), progress),
        Commands::Delete {
            archive,
            files,
            backup_dir,
        } => cmd_delete(&archive, &files, backup_dir),
        Commands::List {
            archive,
            long,
            json,
        } => cmd_list(&archive, long, json),
        Commands::Concat {
            dest,
            sources,
            chunk_size,
            strict,
        } => cmd_concat(
            &dest,
            &sources,
            ArchiveOptions::new()
                .with_chunk_size(chunk_size)
                .with_corruption_policy(policy(strict)),
        ),
        Commands::Test { archive } => cmd_test(&archive),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "hamarc", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
