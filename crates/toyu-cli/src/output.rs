//! Output formatting module

use std::io::{self, Write};

use serde::Serialize;
use toyu_app::app::{
    BackupOutcome, ClearPreview, ExportOutcome, ExportPreview, HistoryView, ImportReport, Quote,
    RestorePreview, StartupReport, TodaySummary,
};
use toyu_types::{DeliveryRecord, MasterSnapshot, OutputFormat, Result};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    println!("{}", content);
    Ok(())
}

fn date_range(first: &Option<String>, last: &Option<String>) -> String {
    match (first, last) {
        (Some(first), Some(last)) if first == last => first.clone(),
        (Some(first), Some(last)) => format!("{} - {}", first, last),
        _ => "-".to_string(),
    }
}

/// Startup notes go to stderr so JSON output stays parseable
pub fn print_startup_notes(report: &StartupReport) {
    if let Some(sweep) = &report.sweep {
        if sweep.deleted > 0 {
            eprintln!(
                "Removed {} exported records dated before {}",
                sweep.deleted, sweep.cutoff
            );
        }
    }
    if let Some(error) = &report.sweep_error {
        eprintln!("Warning: retention sweep skipped: {}", error);
    }
}

fn print_record_table(records: &[DeliveryRecord]) {
    println!(
        "{:<10} {:<5} {:<8} {:<20} {:<12} {:>8} {:>10} {:<4}",
        "Date", "Time", "Customer", "Name", "Tank", "Qty(L)", "Total", "Exp"
    );
    println!("{}", "-".repeat(86));
    for r in records {
        println!(
            "{:<10} {:<5} {:<8} {:<20} {:<12} {:>8.1} {:>10.0} {:<4}",
            r.date,
            r.time,
            r.cust_code,
            r.cust_name,
            r.tank_name,
            r.qty,
            r.total,
            if r.exported { "yes" } else { "" }
        );
    }
}

pub fn print_saved(output_format: OutputFormat, records: &[DeliveryRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(records);
    }

    println!("Saved {} delivery records", records.len());
    print_record_table(records);
    let total: f64 = records.iter().map(|r| r.total).sum();
    println!("{:>78}", format!("Total: {:.0}", total));
    Ok(())
}

pub fn print_quote(output_format: OutputFormat, quote: &Quote) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(quote);
    }

    println!("\nQuote");
    println!("=====");
    println!("Customer:   {} {}", quote.customer_code, quote.customer_name);
    println!("Quantity:   {:.1} L", quote.qty);
    println!("Unit price: {:.2}", quote.unit_price);
    println!("Amount:     {:.0}", quote.price.amount);
    println!("Tax:        {:.0}", quote.price.tax);
    println!("Total:      {:.0}", quote.price.total);
    Ok(())
}

pub fn print_import(output_format: OutputFormat, report: &ImportReport) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(report);
    }

    for file in &report.files {
        match (&file.error, file.kind) {
            (Some(error), _) => println!("  FAILED  {}: {}", file.file, error),
            (None, Some(kind)) => println!(
                "  OK      {}: {} {} rows",
                file.file,
                file.imported,
                kind.label()
            ),
            (None, None) => println!("  OK      {}: {} rows", file.file, file.imported),
        }
    }

    if !report.tank_counts.is_empty() {
        println!("\n{:<10} {:<30} {:>6}", "Code", "Customer", "Tanks");
        println!("{}", "-".repeat(48));
        for count in &report.tank_counts {
            println!(
                "{:<10} {:<30} {:>6}",
                count.customer_code, count.customer_name, count.tanks
            );
        }
    }
    if report.orphan_tanks > 0 {
        println!(
            "\nWarning: {} tanks reference an unknown customer",
            report.orphan_tanks
        );
    }
    Ok(())
}

/// Previews go to stderr with the prompt, so stdout only carries the outcome
pub fn print_export_preview(preview: &ExportPreview) -> Result<()> {
    write_export_preview(&mut io::stderr().lock(), preview)?;
    Ok(())
}

fn write_export_preview(out: &mut impl Write, preview: &ExportPreview) -> io::Result<()> {
    writeln!(out, "\nExport")?;
    writeln!(out, "======")?;
    writeln!(out, "File:      {}", preview.file_name)?;
    writeln!(out, "Encoding:  {}", preview.encoding)?;
    writeln!(out, "Records:   {}", preview.records)?;
    writeln!(
        out,
        "Dates:     {}",
        date_range(&preview.first_date, &preview.last_date)
    )?;
    writeln!(out, "Quantity:  {:.1} L", preview.total_qty)?;
    writeln!(out, "Total:     {:.0}", preview.total)
}

pub fn print_export_outcome(output_format: OutputFormat, outcome: &ExportOutcome) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(outcome);
    }

    match &outcome.path {
        Some(path) => println!(
            "Exported {} records to {}",
            outcome.exported,
            path.display()
        ),
        None => println!("Nothing to export"),
    }
    Ok(())
}

pub fn print_history(output_format: OutputFormat, view: &HistoryView) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(view);
    }

    if view.days.is_empty() {
        println!("No records.");
        return Ok(());
    }

    println!(
        "{:<12} {:>6} {:>10} {:>12} {:>8} {:>8}",
        "Date", "Count", "Qty(L)", "Total", "Pending", "Exported"
    );
    println!("{}", "-".repeat(61));
    for day in &view.days {
        println!(
            "{:<12} {:>6} {:>10.1} {:>12.0} {:>8} {:>8}",
            day.date,
            day.records.len(),
            day.total_qty,
            day.total_amount,
            day.unexported,
            day.exported
        );
    }
    println!("{}", "-".repeat(61));
    println!(
        "{:<12} {:>6} {:>10.1} {:>12.0} {:>8}",
        "Total", view.totals.count, view.totals.qty, view.totals.total, view.totals.unexported
    );
    Ok(())
}

pub fn print_today(output_format: OutputFormat, summary: &TodaySummary) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(summary);
    }

    println!("\nToday ({})", summary.date);
    println!("==================");
    if summary.records.is_empty() {
        println!("No deliveries yet.");
    } else {
        print_record_table(&summary.records);
    }
    println!("\nDeliveries:      {}", summary.totals.count);
    println!("Quantity:        {:.1} L", summary.totals.qty);
    println!("Total:           {:.0}", summary.totals.total);
    println!("Pending export:  {}", summary.pending_export);
    Ok(())
}

pub fn print_backup(output_format: OutputFormat, outcome: Option<&BackupOutcome>) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(&outcome);
    }

    match outcome {
        Some(outcome) => println!(
            "Backed up {} records to {}",
            outcome.records,
            outcome.path.display()
        ),
        None => println!("No records to back up"),
    }
    Ok(())
}

pub fn print_restore_preview(preview: &RestorePreview) -> Result<()> {
    let mut out = io::stderr().lock();
    writeln!(out, "\nRestore")?;
    writeln!(out, "=======")?;
    writeln!(out, "Records in backup:   {}", preview.incoming)?;
    writeln!(
        out,
        "Dates:               {}",
        date_range(&preview.first_date, &preview.last_date)
    )?;
    writeln!(out, "Records to replace:  {}", preview.existing)?;
    Ok(())
}

pub fn print_clear_preview(preview: &ClearPreview) -> Result<()> {
    let mut out = io::stderr().lock();
    writeln!(out, "\nClear")?;
    writeln!(out, "=====")?;
    writeln!(out, "Records:             {}", preview.records)?;
    writeln!(out, "Not yet exported:    {}", preview.unexported)?;
    Ok(())
}

pub fn print_masters(
    output_format: OutputFormat,
    snapshot: &MasterSnapshot,
    with_tanks: bool,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(snapshot);
    }

    if snapshot.is_empty() {
        println!("No master data. Run `toyu-ledger import <files>` first.");
        return Ok(());
    }

    println!(
        "{:<10} {:<30} {:>10} {:>6}",
        "Code", "Name", "Price", "Tanks"
    );
    println!("{}", "-".repeat(59));
    for customer in &snapshot.customers {
        println!(
            "{:<10} {:<30} {:>10.2} {:>6}",
            customer.customer_code,
            customer.official_name,
            customer.unit_price,
            snapshot.tanks_for(&customer.customer_code).len()
        );
    }

    if with_tanks {
        println!(
            "\n{:<10} {:<10} {:<24} {:>10}",
            "Tank", "Customer", "Name", "Cap(L)"
        );
        println!("{}", "-".repeat(57));
        for tank in &snapshot.tanks {
            let capacity = tank
                .tank_capacity
                .map(|c| format!("{:.0}", c))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<10} {:<10} {:<24} {:>10}",
                tank.tank_id, tank.customer_code, tank.tank_name, capacity
            );
        }
    }

    match snapshot.last_import {
        Some(at) => println!("\nLast import: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("\nLast import: -"),
    }
    Ok(())
}
