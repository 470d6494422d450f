//! CLI definition using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use toyu_domain::ExportState;
use toyu_types::{ExportEncoding, OutputFormat};

#[derive(Parser)]
#[command(name = "toyu-ledger")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Kerosene delivery ledger: record fill-ups, export sales, keep backups")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database file. Uses config value if not specified.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Export state filter for the history view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    #[default]
    All,
    Unexported,
    Exported,
}

impl From<StateArg> for ExportState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::All => ExportState::Any,
            StateArg::Unexported => ExportState::Unexported,
            StateArg::Exported => ExportState::Exported,
        }
    }
}

/// Parse `TANK=LITRES`, e.g. `T1=50` or `T1=12.5`
fn parse_tank_qty(arg: &str) -> Result<(String, f64), String> {
    let (tank, qty) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected TANK=LITRES, got '{}'", arg))?;
    let tank = tank.trim();
    if tank.is_empty() {
        return Err(format!("missing tank id in '{}'", arg));
    }
    let qty: f64 = qty
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of litres", qty.trim()))?;
    Ok((tank.to_string(), qty))
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a delivery: one entry per tank with a positive quantity
    Save {
        /// Customer code
        customer: String,

        /// Quantity per tank as TANK=LITRES (repeatable)
        #[arg(long = "tank", short = 't', value_parser = parse_tank_qty, required = true)]
        tanks: Vec<(String, f64)>,
    },

    /// Show amount, tax and total for a quantity without saving
    Quote {
        /// Customer code
        customer: String,

        /// Quantity in litres
        qty: f64,
    },

    /// Import customer and tank master files (JSON or CSV)
    Import {
        /// Master files; each is classified by its columns
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Export unexported records as sales CSV and flag them
    Export {
        /// Output directory. Uses config value if not specified.
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,

        /// CSV encoding. Uses config value if not specified.
        #[arg(long)]
        encoding: Option<ExportEncoding>,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show past deliveries grouped by day
    History {
        /// Filter by export state
        #[arg(long, value_enum, default_value_t = StateArg::All)]
        state: StateArg,

        /// Filter by part of the customer name
        #[arg(long, short = 'c')]
        customer: Option<String>,

        /// Also write the filtered history as an Excel workbook into this directory
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },

    /// Summary of today's deliveries
    Today,

    /// Write every record to a backup JSON file
    Backup {
        /// Output directory. Uses config value if not specified.
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,
    },

    /// Replace the ledger with the records of a backup file
    Restore {
        /// Backup JSON file
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete every delivery record (asks twice)
    Clear,

    /// List customer and tank masters
    Masters {
        /// Also list every tank
        #[arg(long)]
        tanks: bool,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set database file
        #[arg(long)]
        set_database: Option<PathBuf>,

        /// Set days an exported record is kept
        #[arg(long)]
        set_retention_days: Option<u32>,

        /// Set sales CSV output directory
        #[arg(long)]
        set_export_dir: Option<PathBuf>,

        /// Set backup output directory
        #[arg(long)]
        set_backup_dir: Option<PathBuf>,

        /// Set sales CSV encoding
        #[arg(long)]
        set_encoding: Option<ExportEncoding>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set lock wait in milliseconds
        #[arg(long)]
        set_busy_timeout: Option<u64>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
