//! Command handlers

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::{Cli, Commands, StateArg};
use crate::output::{
    print_backup, print_clear_preview, print_export_outcome, print_export_preview, print_history,
    print_import, print_json, print_masters, print_quote, print_restore_preview, print_saved,
    print_startup_notes, print_today,
};
use toyu_app::app::{self, DeliveryRequest, Prepared, Session};
use toyu_app::config::Config;
use toyu_app::export::{history_file_name, history_workbook};
use toyu_app::repository::open_database;
use toyu_domain::collaborator::{ArtifactSink, SystemClock};
use toyu_domain::repository::MasterRepository;
use toyu_infra::DirectorySink;
use toyu_types::{ExportEncoding, OutputFormat, Result};

pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config {
            show,
            set_database,
            set_retention_days,
            set_export_dir,
            set_backup_dir,
            set_encoding,
            set_output,
            set_busy_timeout,
            reset,
        } => cmd_config(
            show,
            set_database,
            set_retention_days,
            set_export_dir,
            set_backup_dir,
            set_encoding,
            set_output,
            set_busy_timeout,
            reset,
        ),
        command => {
            let mut config = Config::load()?;
            if let Some(path) = cli.database {
                config.database_path = Some(path);
            }
            let output_format = cli.format.unwrap_or(config.output_format);
            run(command, &config, output_format)
        }
    }
}

fn run(command: Commands, config: &Config, output_format: OutputFormat) -> Result<()> {
    let session = open_session(config)?;

    match command {
        Commands::Save { customer, tanks } => cmd_save(&session, output_format, customer, tanks),
        Commands::Quote { customer, qty } => cmd_quote(&session, output_format, &customer, qty),
        Commands::Import { files } => cmd_import(&session, output_format, &files),
        Commands::Export {
            output_dir,
            encoding,
            yes,
        } => cmd_export(&session, config, output_format, output_dir, encoding, yes),
        Commands::History {
            state,
            customer,
            xlsx,
        } => cmd_history(&session, output_format, state, customer, xlsx),
        Commands::Today => {
            let summary = app::today(&session)?;
            print_today(output_format, &summary)
        }
        Commands::Backup { output_dir } => cmd_backup(&session, config, output_format, output_dir),
        Commands::Restore { file, yes } => cmd_restore(&session, output_format, &file, yes),
        Commands::Clear => cmd_clear(&session, output_format),
        Commands::Masters { tanks } => {
            let snapshot = session.masters().load_all()?;
            print_masters(output_format, &snapshot, tanks)
        }
        // Handled in `execute` without opening the database
        Commands::Config { .. } => Ok(()),
    }
}

/// Open the database and run the startup sequence (schema check, retention sweep)
fn open_session(config: &Config) -> Result<Session> {
    let db = open_database(config)?;
    let (session, report) = Session::start(db, Box::new(SystemClock), config.retention_days)?;
    debug!(
        database = %report.database,
        schema_version = report.schema_version,
        customers = report.customers,
        tanks = report.tanks,
        "session started"
    );
    print_startup_notes(&report);
    Ok(session)
}

/// Ask on stdin, prompting on stderr so JSON on stdout stays parseable
fn confirm(prompt: &str) -> Result<bool> {
    ask(prompt, &mut io::stdin().lock(), &mut io::stderr())
}

/// Anything but `y` declines
fn ask(prompt: &str, input: &mut impl BufRead, out: &mut impl Write) -> Result<bool> {
    write!(out, "\n{} [y/N] ", prompt)?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn cmd_save(
    session: &Session,
    output_format: OutputFormat,
    customer: String,
    tanks: Vec<(String, f64)>,
) -> Result<()> {
    let request = DeliveryRequest {
        customer_code: customer,
        quantities: tanks,
    };
    let saved = app::save_deliveries(session, &request)?;
    print_saved(output_format, &saved)
}

fn cmd_quote(session: &Session, output_format: OutputFormat, customer: &str, qty: f64) -> Result<()> {
    let quote = app::quote(session, customer, qty)?;
    print_quote(output_format, &quote)
}

fn cmd_import(session: &Session, output_format: OutputFormat, files: &[PathBuf]) -> Result<()> {
    let report = app::import_files(session, files)?;
    print_import(output_format, &report)?;
    if report.failed() > 0 && output_format == OutputFormat::Table {
        println!(
            "\n{} of {} files were not imported; their previous master data was kept",
            report.failed(),
            report.files.len()
        );
    }
    Ok(())
}

fn cmd_export(
    session: &Session,
    config: &Config,
    output_format: OutputFormat,
    output_dir: Option<PathBuf>,
    encoding: Option<ExportEncoding>,
    yes: bool,
) -> Result<()> {
    let mut sink = DirectorySink::new(output_dir.unwrap_or_else(|| config.export_dir()));
    let encoding = encoding.unwrap_or(config.export_encoding);
    let prepared = app::prepare_export(session, &mut sink, encoding)?;

    if !prepared.preview().is_empty() && !yes {
        print_export_preview(prepared.preview())?;
        if !confirm("Write the file and mark these records as exported?")? {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    let outcome = prepared.confirm()?;
    print_export_outcome(output_format, &outcome)
}

fn cmd_history(
    session: &Session,
    output_format: OutputFormat,
    state: StateArg,
    customer: Option<String>,
    xlsx: Option<PathBuf>,
) -> Result<()> {
    let view = app::history(session, state.into(), customer.as_deref())?;
    print_history(output_format, &view)?;

    if let Some(dir) = xlsx {
        let bytes = history_workbook(&view)?;
        let mut sink = DirectorySink::new(dir);
        let path = sink.save(&history_file_name(session.clock().now_local()), &bytes)?;
        eprintln!("Workbook written to {}", path.display());
    }
    Ok(())
}

fn cmd_backup(
    session: &Session,
    config: &Config,
    output_format: OutputFormat,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut sink = DirectorySink::new(output_dir.unwrap_or_else(|| config.backup_dir()));
    let outcome = app::backup(session, &mut sink)?;
    print_backup(output_format, outcome.as_ref())
}

fn cmd_restore(
    session: &Session,
    output_format: OutputFormat,
    file: &Path,
    yes: bool,
) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let prepared = app::prepare_restore(session, &bytes)?;

    if !yes {
        print_restore_preview(prepared.preview())?;
        if !confirm("Replace every record in the ledger with this backup?")? {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    let outcome = prepared.confirm()?;
    if output_format == OutputFormat::Json {
        print_json(&outcome)
    } else {
        println!("Restored {} records from {}", outcome.restored, file.display());
        Ok(())
    }
}

fn cmd_clear(session: &Session, output_format: OutputFormat) -> Result<()> {
    let prepared = app::prepare_clear(session)?;
    if prepared.preview().records == 0 {
        eprintln!("The ledger is already empty.");
        return Ok(());
    }

    print_clear_preview(prepared.preview())?;
    if !confirm("Delete every delivery record?")? {
        eprintln!("Cancelled.");
        return Ok(());
    }
    let second = format!(
        "This cannot be undone. Really delete {} records?",
        prepared.preview().records
    );
    if !confirm(&second)? {
        eprintln!("Cancelled.");
        return Ok(());
    }

    let outcome = prepared.confirm()?;
    if output_format == OutputFormat::Json {
        print_json(&outcome)
    } else {
        println!("Deleted {} records", outcome.deleted);
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    show: bool,
    set_database: Option<PathBuf>,
    set_retention_days: Option<u32>,
    set_export_dir: Option<PathBuf>,
    set_backup_dir: Option<PathBuf>,
    set_encoding: Option<ExportEncoding>,
    set_output: Option<OutputFormat>,
    set_busy_timeout: Option<u64>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(path) = set_database {
        config.database_path = Some(path);
        modified = true;
    }

    if let Some(days) = set_retention_days {
        config.set_retention_days(days)?;
        modified = true;
    }

    if let Some(dir) = set_export_dir {
        config.export_dir = Some(dir);
        modified = true;
    }

    if let Some(dir) = set_backup_dir {
        config.backup_dir = Some(dir);
        modified = true;
    }

    if let Some(encoding) = set_encoding {
        config.export_encoding = encoding;
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(ms) = set_busy_timeout {
        config.busy_timeout_ms = ms;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("\n{}", config);
    }

    Ok(())
}
