use clap::{Parser, Subcommand};
use csvdiff_common::{DiffSettings, ReportLine, ReportSink, Severity};
use csvdiff_core::DiffReport;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csvdiff")]
#[command(author = "CSVDiff Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Keyed comparison of CSV files and directories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two CSV files or two directories of CSV files
    Diff {
        /// Left file or directory
        left: PathBuf,

        /// Right file or directory
        right: PathBuf,

        /// Glob selecting the files to compare under the left directory
        #[arg(short, long)]
        pattern: Option<String>,

        /// Glob removing files from the comparison
        #[arg(short = 'x', long)]
        exclude: Option<String>,

        /// Compare only the named file types from the options file
        /// (can be specified multiple times)
        #[arg(short = 't', long = "file-types")]
        file_types: Vec<String>,

        /// Key column names or 0-based indexes (can be specified multiple times)
        #[arg(short, long = "key-fields")]
        key_fields: Vec<String>,

        /// Column names or indexes excluded from comparison
        #[arg(long = "ignore-fields")]
        ignore_fields: Vec<String>,

        /// Do not report added rows
        #[arg(long)]
        ignore_adds: bool,

        /// Do not report deleted rows
        #[arg(long)]
        ignore_deletes: bool,

        /// Do not report updated rows
        #[arg(long)]
        ignore_updates: bool,

        /// Do not report moved rows
        #[arg(long)]
        ignore_moves: bool,

        /// Compare values ignoring case
        #[arg(short = 'i', long)]
        case_insensitive: bool,

        /// Trim surrounding whitespace before comparing values
        #[arg(long)]
        trim: bool,

        /// Write the report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format: xlsx, html or text (defaults to the output extension)
        #[arg(short, long)]
        format: Option<String>,

        /// Disable ANSI colors in console output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() {
    // Initialize tracing to stderr so report lines own stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Diff {
            left,
            right,
            pattern,
            exclude,
            file_types,
            key_fields,
            ignore_fields,
            ignore_adds,
            ignore_deletes,
            ignore_updates,
            ignore_moves,
            case_insensitive,
            trim,
            output,
            format,
            no_color,
        } => {
            let options = build_settings(
                pattern,
                exclude,
                file_types,
                key_fields,
                ignore_fields,
                ignore_adds,
                ignore_deletes,
                ignore_updates,
                ignore_moves,
                case_insensitive,
                trim,
            );
            if let Err(e) = run_diff(
                &left,
                &right,
                &options,
                output.as_deref(),
                format.as_deref(),
                no_color,
            ) {
                error!("Diff failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_diff(
    left: &Path,
    right: &Path,
    options: &DiffSettings,
    output: Option<&Path>,
    format: Option<&str>,
    no_color: bool,
) -> anyhow::Result<()> {
    let use_color = !no_color && std::io::stdout().is_terminal();
    let mut report = DiffReport::new().with_sink(Box::new(AnsiSink::new(use_color)));

    report.diff(left, right, options)?;

    if let Some(path) = output {
        report.output(path, format)?;
    }
    Ok(())
}

fn build_settings(
    pattern: Option<String>,
    exclude: Option<String>,
    file_types: Vec<String>,
    key_fields: Vec<String>,
    ignore_fields: Vec<String>,
    ignore_adds: bool,
    ignore_deletes: bool,
    ignore_updates: bool,
    ignore_moves: bool,
    case_insensitive: bool,
    trim: bool,
) -> DiffSettings {
    let mut settings = DiffSettings::new();
    if let Some(pattern) = pattern {
        settings.set("pattern", pattern);
    }
    if let Some(exclude) = exclude {
        settings.set("exclude", exclude);
    }
    if !file_types.is_empty() {
        settings.set("file_types", file_types);
    }
    if !key_fields.is_empty() {
        settings.set("key_fields", key_fields);
    }
    if !ignore_fields.is_empty() {
        settings.set("ignore_fields", ignore_fields);
    }
    if ignore_adds {
        settings.set("ignore_adds", true);
    }
    if ignore_deletes {
        settings.set("ignore_deletes", true);
    }
    if ignore_updates {
        settings.set("ignore_updates", true);
    }
    if ignore_moves {
        settings.set("ignore_moves", true);
    }
    if case_insensitive {
        settings.set("case_sensitive", false);
    }
    if trim {
        settings.set("trim_whitespace", true);
    }
    settings
}

/// Writes report lines to stdout, coloring spans by severity.
struct AnsiSink {
    use_color: bool,
}

impl AnsiSink {
    fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn paint(&self, severity: Severity) -> (&'static str, &'static str) {
        if !self.use_color {
            return ("", "");
        }
        match severity {
            Severity::Normal => ("", ""),
            Severity::Warning => ("\x1b[33m", "\x1b[0m"), // Yellow
            Severity::Info => ("\x1b[36m", "\x1b[0m"),    // Cyan
        }
    }
}

impl ReportSink for AnsiSink {
    fn emit(&self, line: &ReportLine) {
        let mut text = String::new();
        for span in &line.spans {
            let (color, reset) = self.paint(span.severity);
            text.push_str(color);
            text.push_str(&span.text);
            text.push_str(reset);
        }
        println!("{}", text);
        println!();
    }
}
