//! Sprig CLI: the command-line interface for the sprig sprite toolchain.
//!
//! Provides `sprig scan` for finding the background images of style sheets
//! that can be assembled into sprites, and `sprig clean` for removing the
//! build cache.

#![warn(missing_docs)]

mod clean;
mod pipeline;
mod scan;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Sprig: sprite analysis for style sheets.
#[derive(Parser, Debug)]
#[command(name = "sprig", version, about = "Sprig sprite toolchain")]
pub struct Cli {
    /// Suppress all output except results and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log output (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `sprig.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find sprite candidates in style sheets.
    Scan(ScanArgs),
    /// Remove the build cache.
    Clean(CleanArgs),
}

/// Arguments for the `sprig scan` subcommand.
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Style sheets to scan.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Images to leave out of sprites (added to the configured list).
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Directory that root-relative urls resolve against.
    #[arg(long)]
    pub image_root: Option<PathBuf>,

    /// Cache directory (overrides `cache.root`).
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Scan everything from scratch without reading or writing the cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Keep cache entries this run did not use.
    #[arg(long)]
    pub keep_stale: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `sprig clean` subcommand.
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Cache directory (overrides `cache.root`).
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Scan(ref args) => scan::run(args, &global),
        Command::Clean(ref args) => clean::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber: 0 = warn, 1 = info, 2+ = debug.
/// `RUST_LOG` takes precedence when set.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "sprig=warn",
        1 => "sprig=info",
        _ => "sprig=debug",
    };
    // Targets are matched by prefix, so `sprig` covers every `sprig_*` crate.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_scan_defaults() {
        let cli = Cli::parse_from(["sprig", "scan", "a.css", "b.css"]);
        match cli.command {
            Command::Scan(ref args) => {
                assert_eq!(args.files, vec![PathBuf::from("a.css"), PathBuf::from("b.css")]);
                assert!(args.ignore.is_empty());
                assert!(args.image_root.is_none());
                assert!(args.cache_dir.is_none());
                assert!(!args.no_cache);
                assert!(!args.keep_stale);
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn parse_scan_with_args() {
        let cli = Cli::parse_from([
            "sprig",
            "scan",
            "main.css",
            "--ignore",
            "/i/logo.png",
            "--ignore",
            "../i/bg.gif",
            "--image-root",
            "/srv/site",
            "--cache-dir",
            "/tmp/sprig",
            "--keep-stale",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Scan(ref args) => {
                assert_eq!(args.ignore, vec!["/i/logo.png", "../i/bg.gif"]);
                assert_eq!(args.image_root, Some(PathBuf::from("/srv/site")));
                assert_eq!(args.cache_dir, Some(PathBuf::from("/tmp/sprig")));
                assert!(args.keep_stale);
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn scan_requires_files() {
        assert!(Cli::try_parse_from(["sprig", "scan"]).is_err());
    }

    #[test]
    fn parse_clean() {
        let cli = Cli::parse_from(["sprig", "clean", "--cache-dir", "out/cache"]);
        match cli.command {
            Command::Clean(ref args) => {
                assert_eq!(args.cache_dir, Some(PathBuf::from("out/cache")));
            }
            _ => panic!("expected Clean command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["sprig", "-q", "-vv", "--color", "never", "clean"]);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["sprig", "--config", "/path/to/sprig.toml", "scan", "a.css"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/sprig.toml"));
    }
}
