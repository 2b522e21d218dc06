use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub const DEFAULT_DEVICE_NAME: &str = "Unknown device";

#[derive(Parser)]
#[command(name = "vaultsync")]
#[command(about = "Inspect vault sync decisions from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute sync actions for a local and a remote manifest
    Diff {
        /// Local manifest (JSON array of files)
        #[arg(long, value_name = "PATH")]
        local: PathBuf,
        /// Remote manifest (JSON array of files, tombstones included)
        #[arg(long, value_name = "PATH")]
        remote: PathBuf,
        /// Name used in conflict copy file names
        #[arg(long, value_name = "NAME", default_value = DEFAULT_DEVICE_NAME)]
        device_name: String,
        /// Conflict timestamp as "YYYY-MM-DD HH:MM" (local time when omitted)
        #[arg(long, value_name = "TIME")]
        at: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Estimate the storage a sync would use and check it against limits
    Quota {
        /// Local manifest (JSON array of files)
        #[arg(long, value_name = "PATH")]
        local: PathBuf,
        /// Remote manifest (JSON array of files, tombstones included)
        #[arg(long, value_name = "PATH")]
        remote: PathBuf,
        /// Bytes already stored for the account
        #[arg(long, value_name = "BYTES", default_value = "0")]
        current_usage: u64,
        /// Per-file size limit in bytes
        #[arg(long, value_name = "BYTES")]
        max_file_size: Option<u64>,
        /// Account storage limit in bytes
        #[arg(long, value_name = "BYTES")]
        storage_limit: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the name a conflict copy of a file would get
    ConflictName {
        /// Original file path
        path: String,
        /// Name of the device that lost the conflict
        #[arg(long, value_name = "NAME")]
        device_name: String,
        /// Conflict timestamp as "YYYY-MM-DD HH:MM" (local time when omitted)
        #[arg(long, value_name = "TIME")]
        at: Option<String>,
    },
    /// Compare two vector clocks given as JSON objects
    Compare {
        /// First clock, e.g. '{"laptop":2}'
        clock_a: String,
        /// Second clock
        clock_b: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
