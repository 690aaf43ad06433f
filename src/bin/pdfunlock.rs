//! CLI binary for pdf-unlock.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `UnlockConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_unlock::{
    inspect, run, CollisionPolicy, FileReport, ProgressCallback, RunProgressCallback, RunSummary,
    UnlockConfig,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a progress bar plus one line per file.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Spinner until the scan reports how many files there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Listing source directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Unlocking");
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_files: usize) {
        self.activate_bar(total_files);
    }

    fn on_file_start(&self, _index: usize, _total: usize, file_name: &str) {
        self.bar.set_message(file_name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, report: &FileReport) {
        let mark = if report.is_failure() {
            red("✗")
        } else {
            green("✓")
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<40}  {}",
            mark,
            index,
            total,
            report.file_name,
            dim(report.label()),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Unlock everything in ./inbox, write results under ./out
  pdfunlock ./inbox ./out

  # Only treat files untouched for an hour, skip documents over 50 pages
  pdfunlock -a 3600 -p 50 ./inbox ./out

  # Documents protected by a real user password
  pdfunlock --password s3cret ./inbox ./out

  # Machine-readable report, non-zero exit if any file failed
  pdfunlock --json --strict ./inbox ./out > report.json

  # Inspect a single file
  pdfunlock --inspect ./inbox/scan.pdf

OUTPUT LAYOUT:
  <destination>/<YYYYMMDDHHMMSS>_backup/<original-filename>
  <destination>/<YYYYMMDDHHMMSS>_new/<normalized-filename>

  Output names are lower-cased; a trailing .pdf.convert or .pdf.import
  becomes .pdf. Files that are not PDFs are archived without a rewrite.

EXIT STATUS:
  0  run completed (individual file failures are logged)
  1  fatal error (output folders, unreadable source, bad arguments)
  2  --strict and at least one file failed
"#;

/// Remove password protection from PDFs and archive the originals.
#[derive(Parser, Debug)]
#[command(
    name = "pdfunlock",
    version,
    about = "Remove password protection from PDFs and archive the originals",
    long_about = "Rewrite every PDF in SOURCE_DIRECTORY without encryption into \
<DESTINATION>/<timestamp>_new and move each original into \
<DESTINATION>/<timestamp>_backup.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the password-protected PDFs.
    #[arg(required_unless_present = "inspect")]
    source_directory: Option<PathBuf>,

    /// Directory where the backup and new folders are created.
    #[arg(required_unless_present = "inspect")]
    destination_directory: Option<PathBuf>,

    /// Only treat files at least this many seconds old.
    #[arg(
        short = 'a',
        long = "age_of_file_to_treat",
        visible_alias = "age",
        env = "PDFUNLOCK_MIN_AGE",
        value_name = "SECONDS"
    )]
    age_of_file_to_treat: Option<f64>,

    /// Archive but do not rewrite PDFs with more pages than this.
    #[arg(
        short = 'p',
        long = "max_pages",
        visible_alias = "max-pages",
        env = "PDFUNLOCK_MAX_PAGES",
        value_name = "PAGES"
    )]
    max_pages: Option<usize>,

    /// User password for encrypted documents (default: empty password).
    #[arg(long, env = "PDFUNLOCK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// What to do when two files normalise to the same output name.
    #[arg(long, env = "PDFUNLOCK_ON_COLLISION", value_enum, default_value = "rename")]
    on_collision: CollisionArg,

    /// Number of files processed at once (1 keeps strict listing order).
    #[arg(short = 'j', long, env = "PDFUNLOCK_JOBS", default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..=256))]
    jobs: u16,

    /// Print the run summary as JSON on stdout.
    #[arg(long, env = "PDFUNLOCK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFUNLOCK_NO_PROGRESS")]
    no_progress: bool,

    /// Wait for Enter before exiting.
    #[arg(long)]
    pause: bool,

    /// Exit with status 2 if any file failed to rewrite or move.
    #[arg(long, env = "PDFUNLOCK_STRICT")]
    strict: bool,

    /// Print page count, version and encryption of one PDF, then exit.
    #[arg(long, value_name = "PDF", conflicts_with_all = ["source_directory", "destination_directory"])]
    inspect: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFUNLOCK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFUNLOCK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CollisionArg {
    Rename,
    Overwrite,
    Skip,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(v: CollisionArg) -> Self {
        match v {
            CollisionArg::Rename => CollisionPolicy::Rename,
            CollisionArg::Overwrite => CollisionPolicy::Overwrite,
            CollisionArg::Skip => CollisionPolicy::Skip,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // While the progress bar is drawn, only errors go through tracing; the
    // bar already prints one line per file.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.inspect.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect mode ─────────────────────────────────────────────────────
    if let Some(ref path) = cli.inspect {
        let info = inspect(path, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize PDF info")?
            );
        } else {
            println!("File:         {}", path.display());
            println!("Pages:        {}", info.page_count);
            println!("PDF Version:  {}", info.pdf_version);
            println!("Encrypted:    {}", info.is_encrypted);
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = run(&config).await.context("Run aborted")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&summary);
    }

    if cli.pause {
        wait_for_enter()?;
    }

    if cli.strict && summary.has_failures() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `UnlockConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<UnlockConfig> {
    // clap guarantees both are present outside inspect mode.
    let source = cli
        .source_directory
        .as_ref()
        .context("SOURCE_DIRECTORY is required")?;
    let destination = cli
        .destination_directory
        .as_ref()
        .context("DESTINATION_DIRECTORY is required")?;

    let mut builder = UnlockConfig::builder(source, destination)
        .collision_policy(cli.on_collision.into())
        .concurrency(cli.jobs as usize);

    if let Some(age) = cli.age_of_file_to_treat {
        builder = builder.min_age_secs(age);
    }
    if let Some(max) = cli.max_pages {
        builder = builder.max_pages(max);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(summary: &RunSummary) {
    let mark = if summary.has_failures() {
        yellow("⚠")
    } else {
        green("✔")
    };
    eprintln!(
        "{} {} file(s) moved to {}",
        mark,
        bold(&summary.files_moved.to_string()),
        summary.backup_dir.display()
    );
    eprintln!(
        "   {} pdf file(s) rewritten into {}",
        bold(&summary.pdfs_rewritten.to_string()),
        summary.new_dir.display()
    );

    let skipped =
        summary.skipped_too_young + summary.skipped_too_many_pages + summary.superseded;
    if skipped > 0 {
        eprintln!(
            "   {}",
            dim(&format!(
                "{} too young, {} over the page limit, {} superseded",
                summary.skipped_too_young, summary.skipped_too_many_pages, summary.superseded
            ))
        );
    }
    if summary.has_failures() {
        eprintln!(
            "   {}",
            red(&format!(
                "{} rewrite failure(s), {} archive failure(s)",
                summary.rewrite_failures, summary.archive_failures
            ))
        );
    }
    eprintln!("   {}", dim(&format!("{}ms total", summary.duration_ms)));
}

fn wait_for_enter() -> Result<()> {
    eprint!("Press enter to continue...");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(())
}
