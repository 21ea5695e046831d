//! CLI binary for log2txt.
//!
//! `serve` runs the HTTP front end; every other subcommand runs one pipeline
//! operation directly against a scratch directory and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log2txt::{
    build_service, router, ConversionProgressCallback, FsStore, LogService, PipelineConfig,
    ProgressCallback, ServerConfig, UploadedFile,
};
use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} files…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total_files: usize, source_name: &str) {
        self.bar.set_message(source_name.to_string());
    }

    fn on_file_complete(&self, index: usize, total_files: usize, output_name: &str, bytes: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total_files,
            output_name,
            dim(&format!("{bytes} bytes")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total_files: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total_files,
            red(error)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, written: usize) {
        self.bar.finish_and_clear();
        if written == total_files && self.errors.load(Ordering::SeqCst) == 0 {
            eprintln!("{} {} files converted", green("✔"), bold(&written.to_string()));
        } else {
            eprintln!(
                "{} {}/{} files converted",
                red("✘"),
                bold(&written.to_string()),
                total_files
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the upload page on http://localhost:3000 and open it
  log2txt serve

  # Serve on all interfaces without opening a browser
  log2txt serve --bind 0.0.0.0:8080 --no-browser

  # Expose an extra read-only folder for ?folder=reports downloads
  log2txt serve --area reports=/var/reports

  # Convert logs straight into the scratch directory
  log2txt convert app.log worker.log --out public/converted

  # Merge two converted files and zip everything
  log2txt merge-text app.txt worker.txt
  log2txt archive

ENVIRONMENT VARIABLES:
  LOG2TXT_OUT             Scratch directory (default: public/converted)
  LOG2TXT_BIND            Server bind address (default: 127.0.0.1:3000)
  LOG2TXT_NO_BROWSER      Do not open the browser on `serve`
  BROWSER                 Program used to open the browser
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Convert .log uploads to LF-terminated text, merge them and download them.
#[derive(Parser, Debug)]
#[command(
    name = "log2txt",
    version,
    about = "Convert .log files to LF-terminated .txt files, merge and download them",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Deflate level for the zip archive (0–9).
    #[arg(long, global = true, env = "LOG2TXT_COMPRESSION_LEVEL", default_value_t = 9,
          value_parser = clap::value_parser!(u32).range(0..=9))]
    compression_level: u32,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "LOG2TXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LOG2TXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "LOG2TXT_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug, Clone)]
struct StoreArgs {
    /// Scratch directory holding every artifact. Created if missing.
    #[arg(long, env = "LOG2TXT_OUT", default_value = "public/converted")]
    out: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Address to listen on.
        #[arg(long, env = "LOG2TXT_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Maximum upload request size in MiB.
        #[arg(long, env = "LOG2TXT_MAX_UPLOAD_MB", default_value_t = 64)]
        max_upload_mb: usize,

        /// Do not open the browser once the server is listening.
        #[arg(long, env = "LOG2TXT_NO_BROWSER")]
        no_browser: bool,

        /// Extra read-only download area, as NAME=DIR. Repeatable.
        #[arg(long = "area", value_name = "NAME=DIR", value_parser = parse_area)]
        areas: Vec<(String, PathBuf)>,
    },

    /// Convert .log files to .txt, replacing the previous batch.
    Convert {
        #[command(flatten)]
        store: StoreArgs,

        /// Files to convert.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Concatenate raw files into merged.log.
    MergeLogs {
        #[command(flatten)]
        store: StoreArgs,

        /// Files to merge, in order (at least two).
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Concatenate stored .txt artifacts into merged.txt.
    MergeText {
        #[command(flatten)]
        store: StoreArgs,

        /// Artifact names to merge, in order (at least two).
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Build converted_files.zip from every .txt artifact.
    Archive {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Delete every artifact in the scratch directory.
    Clear {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The server has no progress bar, so it logs at INFO by default.
    let is_serve = matches!(cli.command, Command::Serve { .. });
    let show_progress = !cli.quiet && !cli.no_progress && !is_serve;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    match cli.command {
        Command::Serve {
            store,
            bind,
            max_upload_mb,
            no_browser,
            areas,
        } => {
            let server = ServerConfig {
                bind_addr: bind,
                scratch_dir: store.out,
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
                open_browser: !no_browser,
                extra_areas: areas.into_iter().collect::<BTreeMap<_, _>>(),
            };
            serve(server, config).await?;
        }
        Command::Convert { store, files } => {
            let service = open_service(&store, config).await?;
            let uploads = read_files(&files).await?;
            let out = service.convert(uploads).await.context("Conversion failed")?;
            if !show_progress && !cli.quiet {
                for name in &out.converted_files {
                    eprintln!("{} {}", green("✓"), name);
                }
            }
            print_location(&service, &store, cli.quiet);
        }
        Command::MergeLogs { store, files } => {
            let service = open_service(&store, config).await?;
            let uploads = read_files(&files).await?;
            let merged = service.merge_logs(uploads).await.context("Merge failed")?;
            if !cli.quiet {
                eprintln!(
                    "{} merged {} files into {}",
                    green("✔"),
                    files.len(),
                    bold(&merged.merged_file_name)
                );
            }
            print_location(&service, &store, cli.quiet);
        }
        Command::MergeText { store, names } => {
            let service = open_service(&store, config).await?;
            let merged = service.merge_text(&names).await.context("Merge failed")?;
            if !cli.quiet {
                eprintln!(
                    "{} merged {} artifacts into {}",
                    green("✔"),
                    names.len(),
                    bold(&merged.merged_file_name)
                );
            }
            print_location(&service, &store, cli.quiet);
        }
        Command::Archive { store } => {
            let service = open_service(&store, config).await?;
            let archive = service
                .download_all()
                .await
                .context("Failed to build archive")?;
            if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    green("✔"),
                    bold(&archive.file_name),
                    dim(&format!("{} bytes", archive.len))
                );
            }
            print_location(&service, &store, cli.quiet);
        }
        Command::Clear { store } => {
            let service = open_service(&store, config).await?;
            let report = service.clear_cache().await.context("Failed to clear cache")?;
            if !cli.quiet {
                eprintln!(
                    "{} {} {}",
                    green("✔"),
                    report.message,
                    dim(&format!("({} removed)", report.removed))
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder().compression_level(cli.compression_level);
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

/// Parse `--area NAME=DIR`.
fn parse_area(s: &str) -> Result<(String, PathBuf), String> {
    let (name, dir) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=DIR, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() || dir.trim().is_empty() {
        return Err(format!("expected NAME=DIR, got '{s}'"));
    }
    Ok((name.to_string(), PathBuf::from(dir.trim())))
}

async fn open_service(store: &StoreArgs, config: PipelineConfig) -> Result<LogService> {
    let fs = FsStore::open(&store.out)
        .await
        .with_context(|| format!("Failed to open scratch directory {:?}", store.out))?;
    Ok(LogService::new(Arc::new(fs), config))
}

/// Read local files as uploads named after their file name.
async fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        uploads.push(UploadedFile::new(upload_name(path), bytes));
    }
    Ok(uploads)
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn print_location(service: &LogService, store: &StoreArgs, quiet: bool) {
    if !quiet {
        eprintln!(
            "   {} {}",
            dim("in"),
            dim(&format!("{} ({})", service.store().describe(), store.out.display()))
        );
    }
}

// ── Server ───────────────────────────────────────────────────────────────────

async fn serve(server: ServerConfig, config: PipelineConfig) -> Result<()> {
    let service = build_service(&server, config)
        .await
        .context("Failed to prepare storage")?;
    let app = router(Arc::new(service), server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server.bind_addr))?;
    let url = server.public_url();
    info!("listening on {}", url);

    if server.open_browser {
        if let Err(e) = browser_launch::open_url(&url) {
            warn!("Could not open browser: {}", e);
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

/// Graceful shutdown on SIGTERM or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl-C, shutting down"); }
        _ = terminate => { info!("received SIGTERM, shutting down"); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_parsing() {
        assert_eq!(
            parse_area("reports=/var/reports").unwrap(),
            ("reports".to_string(), PathBuf::from("/var/reports"))
        );
        assert!(parse_area("reports").is_err());
        assert!(parse_area("=/tmp").is_err());
        assert!(parse_area("x=").is_err());
    }

    #[test]
    fn upload_name_is_file_name() {
        assert_eq!(upload_name(Path::new("/var/log/app.log")), "app.log");
        assert_eq!(upload_name(Path::new("app.log")), "app.log");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["log2txt", "convert", "a.log", "b.log", "--out", "/tmp/x"])
            .unwrap();
        match cli.command {
            Command::Convert { store, files } => {
                assert_eq!(store.out, PathBuf::from("/tmp/x"));
                assert_eq!(files.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["log2txt", "serve", "--no-browser", "--area", "r=/tmp"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve { no_browser: true, ref areas, .. } if areas.len() == 1
        ));
    }

    #[test]
    fn compression_level_is_bounded() {
        assert!(Cli::try_parse_from(["log2txt", "--compression-level", "10", "clear"]).is_err());
    }
}
