//! CLI for MBP-10 reconstruction from MBO CSV data.
//!
//! Reads a Market-by-Order CSV stream, reconstructs the top ten price
//! levels of each side, and writes one MBP-10 row for every event that
//! altered the top of the book.
//!
//! # Usage
//!
//! ```bash
//! # Default output path (output_mbp.csv)
//! cargo run --release --bin reconstruct_mbp -- input_mbo.csv
//!
//! # Explicit output path
//! cargo run --release --bin reconstruct_mbp -- input_mbo.csv mbp.csv
//! ```

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use mbp_reconstructor::source::{CsvSource, MarketDataSource};
use mbp_reconstructor::writer::{format_price, MbpCsvWriter};
use mbp_reconstructor::{Reconstructor, Result};

/// How often (in events) progress is reported and output flushed.
const PROGRESS_INTERVAL: u64 = 100_000;

/// Command-line arguments.
struct Args {
    /// Input MBO CSV file
    input: PathBuf,
    /// Output MBP-10 CSV file
    output: PathBuf,
}

fn parse_args() -> std::result::Result<Args, String> {
    let args: Vec<String> = std::env::args().collect();

    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;

    for arg in &args[1..] {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {arg}"));
            }
            arg => {
                if input.is_none() {
                    input = Some(PathBuf::from(arg));
                } else if output.is_none() {
                    output = Some(PathBuf::from(arg));
                } else {
                    return Err(format!("Unexpected argument: {arg}"));
                }
            }
        }
    }

    let input = input.ok_or("Input file is required")?;
    let output = output.unwrap_or_else(|| {
        log::info!("Using default output filename: output_mbp.csv");
        PathBuf::from("output_mbp.csv")
    });

    Ok(Args { input, output })
}

fn print_help() {
    eprintln!(
        r#"
MBP-10 Order Book Reconstruction

Reconstructs MBP-10 (top ten price levels per side) output from an MBO
(per-order) CSV event stream:
  - The first clear (R) action marks session start and emits nothing
  - T->F->C sequences coalesce: the trade reports, the cancel removes
  - Trades land on the book side that actually changes
  - Neutral-side (N) trades are ignored

USAGE:
    reconstruct_mbp <input_mbo.csv> [output_mbp.csv]

ARGUMENTS:
    <input_mbo.csv>     Input MBO CSV file to process
    [output_mbp.csv]    Output MBP-10 CSV file (default: output_mbp.csv)

OPTIONS:
    -h, --help          Print this help message
"#
    );
}

fn run(args: &Args) -> Result<()> {
    let start = Instant::now();

    log::info!("Input file: {}", args.input.display());
    log::info!("Output file: {}", args.output.display());

    let source = CsvSource::new(&args.input)?;
    let estimated = source.metadata().estimated_events;
    if let Some(size) = source.metadata().file_size {
        log::info!("File size: {size} bytes, ~{} events", estimated.unwrap_or(0));
    }

    let mut writer = MbpCsvWriter::from_path(&args.output)?;
    writer.write_header()?;

    let mut recon = Reconstructor::new();
    let mut events = source.events()?;

    for ev in &mut events {
        if let Some(snap) = recon.process(&ev) {
            writer.write_snapshot(snap)?;
        }

        let processed = recon.stats().events_processed;
        if processed % PROGRESS_INTERVAL == 0 {
            match estimated {
                Some(total) if total > 0 => log::info!(
                    "Progress: {:.1}% ({} events, {} rows)",
                    (processed as f64 / total as f64) * 100.0,
                    processed,
                    recon.rows_emitted()
                ),
                _ => log::info!(
                    "Progress: {} events, {} rows",
                    processed,
                    recon.rows_emitted()
                ),
            }
            writer.flush()?;
        }
    }

    writer.flush()?;

    let reader_stats = *events.stats();
    let stats = *recon.stats();
    let book = recon.book();
    let elapsed = start.elapsed().as_secs_f64();

    println!("\n=== Reconstruction Summary ===");
    println!("Records read:       {}", reader_stats.records_read);
    println!(
        "Records skipped:    {} ({:.2}% parsed)",
        reader_stats.records_skipped,
        reader_stats.success_rate()
    );
    println!("Events processed:   {}", stats.events_processed);
    println!(
        "  adds={} cancels={} trades={} fills={} clears={} modifies={} skipped={}",
        stats.adds, stats.cancels, stats.trades, stats.fills, stats.clears, stats.modifies,
        stats.skipped
    );
    println!("MBP rows written:   {}", stats.snapshots_emitted);
    if stats.events_processed > 0 {
        println!(
            "Update ratio:       {:.2}%",
            (stats.snapshots_emitted as f64 / stats.events_processed as f64) * 100.0
        );
        println!(
            "Throughput:         {:.0} events/sec",
            stats.events_processed as f64 / elapsed
        );
    }

    println!("Final book state:");
    println!(
        "  best bid/ask:     {} / {}",
        book.best_bid().map_or_else(|| "-".to_string(), format_price),
        book.best_ask().map_or_else(|| "-".to_string(), format_price)
    );
    println!(
        "  active levels:    {} bids, {} asks",
        book.bid_level_count(),
        book.ask_level_count()
    );
    println!("  active orders:    {}", book.order_count());

    let warnings = recon.warnings().summary();
    if warnings.total > 0 {
        println!("Warnings:           {}", warnings.total);
        let mut categories: Vec<_> = warnings.by_category.iter().collect();
        categories.sort();
        for (category, count) in categories {
            println!("  {category}: {count}");
        }
    }

    println!("Total time:         {elapsed:.2}s");
    println!("Output written to:  {}", args.output.display());

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --help for usage information");
            process::exit(1);
        }
    };

    if !args.input.exists() {
        eprintln!("Error: Cannot access input file: {}", args.input.display());
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
