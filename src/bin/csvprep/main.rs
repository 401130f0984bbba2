//! csvprep CLI tool for running and benchmarking stage-1 CSV preprocessing.

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use csvprep::{DeferredQueue, HaltReason, ScanConfig, ScanState, Stage1};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "csvprep")]
#[command(about = "Quote-aware CSV preprocessing toolkit", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sanitize a CSV file and report deferred windows
    Scan(ScanArgs),
    /// Generate synthetic CSV files for benchmarking and testing
    Generate(GenerateArgs),
}

/// Sanitize a CSV file and report deferred windows
#[derive(Debug, Parser)]
struct ScanArgs {
    /// Input file
    file: PathBuf,

    /// Field delimiter (a single byte, or "tab")
    #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Deferred-queue capacity; the queue is drained every time it fills
    #[arg(long, default_value = "1024")]
    queue_capacity: usize,

    /// Write the sanitized buffer to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the offset of every deferred window to stdout
    #[arg(long)]
    list_deferred: bool,

    /// Log scan progress to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Generate synthetic CSV files for benchmarking and testing
#[derive(Debug, Parser)]
struct GenerateArgs {
    /// Size of CSV to generate (supports b, kb, mb, gb - case insensitive)
    /// Examples: 1024, 1kb, 512MB, 2Gb
    #[arg(value_parser = parse_size)]
    size: usize,

    /// Output file path (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// CSV pattern to generate
    #[arg(short, long, default_value = "pathological")]
    pattern: PatternArg,

    /// Random seed for reproducible generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Field delimiter (a single byte, or "tab")
    #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,
}

#[derive(Debug, Clone, ValueEnum)]
enum PatternArg {
    /// Plain tabular data, no quotes (fast path only)
    Tabular,
    /// Quoted fields containing delimiters
    Quoted,
    /// Quoted fields containing newlines
    Multiline,
    /// Escaped quotes inside quoted fields (deferral heavy)
    Escaped,
    /// CRLF records with CRLF inside quoted fields
    Crlf,
    /// Worst case: delimiters, escapes and line breaks in every field
    Pathological,
}

impl From<PatternArg> for generators::CsvPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Tabular => generators::CsvPattern::Tabular,
            PatternArg::Quoted => generators::CsvPattern::Quoted,
            PatternArg::Multiline => generators::CsvPattern::Multiline,
            PatternArg::Escaped => generators::CsvPattern::Escaped,
            PatternArg::Crlf => generators::CsvPattern::Crlf,
            PatternArg::Pathological => generators::CsvPattern::Pathological,
        }
    }
}

/// Parse size string like "1mb", "512KB", "2GB", "1024" (case insensitive)
fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim().to_lowercase();

    // Try parsing as plain number first
    if let Ok(bytes) = s.parse::<usize>() {
        return Ok(bytes);
    }

    let (num_str, unit) = if let Some(n) = s.strip_suffix("gb") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("mb") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("kb") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('b') {
        (n, 1)
    } else {
        return Err(format!(
            "Invalid size format: '{}'. Use format like '1mb', '512KB', or '1024'",
            s
        ));
    };

    num_str
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(unit))
        .ok_or_else(|| format!("Invalid number in size: '{}'", s))
}

/// Parse a delimiter argument: one ASCII character, or "tab".
fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!(
                "Invalid delimiter: '{}'. Use a single ASCII character or 'tab'",
                s
            )),
        },
    }
}

/// Minimal stderr logger for the library's `log` output.
///
/// Levels are filtered by `log::set_max_level`; records from other crates
/// are dropped.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        let target = metadata.target();
        target == "csvprep" || target.starts_with("csvprep::")
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    // Only fails if a logger is already installed
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Totals from a drained scan.
#[derive(Debug, Default, PartialEq, Eq)]
struct ScanSummary {
    bytes: usize,
    windows: usize,
    deferred: Vec<usize>,
    resumes: usize,
    inside_quotes: bool,
}

/// Scan the whole buffer, draining the deferred queue whenever it fills.
fn scan_buffer(stage: &Stage1, buffer: &mut [u8], queue_capacity: usize) -> Result<ScanSummary> {
    ensure!(queue_capacity > 0, "queue capacity must be at least 1");

    let mut slots = vec![0usize; queue_capacity];
    let mut state = ScanState::default();
    let mut summary = ScanSummary::default();
    let mut offset = 0;

    loop {
        let mut deferred = DeferredQueue::new(&mut slots);
        let outcome = stage
            .scan_outcome(buffer, &mut state, &mut deferred, offset)
            .with_context(|| format!("scan failed at offset {}", offset))?;

        // Stand-in for the slow path: collect what it would re-examine
        summary.deferred.extend_from_slice(deferred.as_slice());
        offset = outcome.processed;

        if outcome.halt != HaltReason::QueueFull {
            break;
        }
        summary.resumes += 1;
    }

    summary.bytes = offset;
    summary.windows = offset.div_ceil(csvprep::stage1::WINDOW_SIZE);
    summary.inside_quotes = state.inside_quotes;
    Ok(summary)
}

fn run_scan(args: ScanArgs) -> Result<()> {
    init_logging(args.verbose);

    let mut buffer = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let config = ScanConfig::csv().with_delimiter(args.delimiter);
    let stage = Stage1::new(config).context("Invalid scan configuration")?;

    let start = Instant::now();
    let summary = scan_buffer(&stage, &mut buffer, args.queue_capacity)?;
    let elapsed = start.elapsed();

    let secs = elapsed.as_secs_f64();
    let throughput = if secs > 0.0 {
        summary.bytes as f64 / secs / (1024.0 * 1024.0)
    } else {
        0.0
    };

    eprintln!(
        "✓ Scanned {} bytes ({} windows) with {} backend in {:.3?} ({:.1} MiB/s)",
        summary.bytes,
        summary.windows,
        stage.backend().name(),
        elapsed,
        throughput
    );
    eprintln!(
        "  {} deferred windows, {} resumes after a full queue",
        summary.deferred.len(),
        summary.resumes
    );
    if summary.inside_quotes {
        eprintln!("  warning: input ends inside a quoted field");
    }

    if args.list_deferred {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for offset in &summary.deferred {
            writeln!(out, "{}", offset)?;
        }
    }

    if let Some(path) = args.output {
        std::fs::write(&path, &buffer)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("✓ Wrote {} bytes to {}", buffer.len(), path.display());
    }

    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let csv = generate_csv(
        args.size,
        args.pattern.into(),
        args.seed,
        char::from(args.delimiter),
    );

    match args.output {
        Some(path) => {
            std::fs::write(&path, &csv)?;
            eprintln!("✓ Wrote {} bytes to {}", csv.len(), path.display());
        }
        None => {
            print!("{}", csv);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan(args) => run_scan(args),
        Command::Generate(args) => run_generate(args),
    }
}

mod generators;
use generators::generate_csv;

#[cfg(test)]
mod tests {
    use super::generators::CsvPattern;
    use super::*;
    use log::Log;

    #[test]
    fn test_logger_keeps_only_own_records() {
        for (target, expected) in [
            ("csvprep", true),
            ("csvprep::stage1::driver", true),
            ("csvprep_other", false),
            ("clap_builder", false),
        ] {
            let metadata = log::Metadata::builder().target(target).build();
            assert_eq!(LOGGER.enabled(&metadata), expected, "{}", target);
        }
    }

    #[test]
    fn test_parse_size() {
        // Plain numbers
        assert_eq!(parse_size("1024").unwrap(), 1024);

        // Bytes (case insensitive)
        assert_eq!(parse_size("100b").unwrap(), 100);
        assert_eq!(parse_size("100B").unwrap(), 100);

        // Kilobytes
        assert_eq!(parse_size("1kb").unwrap(), 1024);
        assert_eq!(parse_size("512KB").unwrap(), 512 * 1024);

        // Megabytes
        assert_eq!(parse_size("1Mb").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("10mb").unwrap(), 10 * 1024 * 1024);

        // Gigabytes
        assert_eq!(parse_size("2Gb").unwrap(), 2 * 1024 * 1024 * 1024);

        // With whitespace
        assert_eq!(parse_size(" 1mb ").unwrap(), 1024 * 1024);

        // Errors
        assert!(parse_size("abc").is_err());
        assert!(parse_size("1tb").is_err());
        assert!(parse_size("").is_err());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("|").unwrap(), b'|');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("\t").unwrap(), b'\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(",,").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_scan_buffer_drains_full_queue() {
        let stage = Stage1::new(ScanConfig::csv()).unwrap();
        let mut buffer = generate_csv(4096, CsvPattern::Escaped, Some(7), ',').into_bytes();

        let small = scan_buffer(&stage, &mut buffer.clone(), 1).unwrap();
        let large = scan_buffer(&stage, &mut buffer, 1024).unwrap();

        assert_eq!(small.deferred, large.deferred);
        assert_eq!(small.bytes, large.bytes);
        assert!(small.resumes > 0);
        assert_eq!(large.resumes, 0);
        assert!(!large.inside_quotes);
    }

    #[test]
    fn test_scan_buffer_rejects_zero_capacity() {
        let stage = Stage1::new(ScanConfig::csv()).unwrap();
        let mut buffer = b"a,b\n".to_vec();
        assert!(scan_buffer(&stage, &mut buffer, 0).is_err());
    }

    #[test]
    fn test_scan_buffer_tabular_has_no_deferrals() {
        let stage = Stage1::new(ScanConfig::csv()).unwrap();
        let mut buffer = generate_csv(4096, CsvPattern::Tabular, Some(1), ',').into_bytes();
        let original = buffer.clone();

        let summary = scan_buffer(&stage, &mut buffer, 16).unwrap();

        assert!(summary.deferred.is_empty());
        assert_eq!(summary.bytes, original.len());
        assert_eq!(buffer, original);
    }
}
