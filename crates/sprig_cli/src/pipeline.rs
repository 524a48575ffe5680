//! Shared pipeline helpers for CLI commands.
//!
//! Loads configuration, turns CLI flags into scan settings, and runs the
//! parse-then-scan step for each style sheet through a file-keyed cache
//! section. Style sheets are processed in parallel; every worker gets its
//! own forked [`CacheManager`].

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use sprig_cache::{CacheError, CacheManager};
use sprig_config::SprigConfig;
use sprig_css::parse_stylesheet;
use sprig_diagnostics::{Diagnostic, DiagnosticSink};
use sprig_source::SourceMap;
use sprig_sprite::{scan, ScanResult, ScanSettings};
use tracing::{debug, warn};

use crate::GlobalArgs;

/// Cache category of per-file scans.
pub const SCAN_CATEGORY: &str = "imageassembly-scan";

/// Output name of a stored scan result.
const SCAN_OUTPUT: &str = "scan";

/// Errors that stop the pipeline for one style sheet.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The style sheet could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The style sheet.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache rejected an operation.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A scan result could not be encoded for the cache.
    #[error("cannot encode scan of {path}: {source}")]
    Encode {
        /// The style sheet.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Loads `sprig.toml` from `--config` or the current directory.
pub fn load_project_config(global: &GlobalArgs) -> Result<SprigConfig, Box<dyn std::error::Error>> {
    let config = match global.config {
        Some(ref path) => sprig_config::load_config_file(Path::new(path))?,
        None => sprig_config::load_config(&std::env::current_dir()?)?,
    };
    Ok(config)
}

/// Scan settings from config, with CLI flags taking precedence.
///
/// `--image-root` replaces the configured root; `--ignore` entries are
/// added to the configured ones.
pub fn merge_scan_settings(
    config: &SprigConfig,
    image_root: Option<&Path>,
    ignore: &[String],
) -> ScanSettings {
    let mut merged = config.sprite.ignore.clone();
    for entry in ignore {
        if !merged.contains(entry) {
            merged.push(entry.clone());
        }
    }
    ScanSettings {
        image_root: image_root
            .map(Path::to_path_buf)
            .or_else(|| config.sprite.image_root.clone()),
        ignore: merged,
    }
}

/// The outcome of scanning one style sheet.
#[derive(Debug)]
pub struct FileScan {
    /// The style sheet.
    pub path: PathBuf,
    /// The result came from the cache.
    pub reused: bool,
    /// The scan result, absent if validation failed.
    pub result: Option<ScanResult>,
    /// Parse and validation diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// Sources the diagnostics point into. Empty for reused results.
    pub sources: SourceMap,
}

impl FileScan {
    /// Returns `true` if the style sheet failed to parse or validate.
    pub fn failed(&self) -> bool {
        self.result.is_none() || self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    fn reused(path: &Path, result: ScanResult) -> Self {
        Self {
            path: path.to_path_buf(),
            reused: true,
            result: Some(result),
            diagnostics: Vec::new(),
            sources: SourceMap::new(),
        }
    }
}

/// Parses and scans `path` without the cache.
pub fn analyze(path: &Path, settings: &ScanSettings) -> Result<FileScan, PipelineError> {
    let mut sources = SourceMap::new();
    let id = sources.load(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let sink = DiagnosticSink::new();
    let sheet = parse_stylesheet(id, &sources, &sink);
    let result = match scan(&sheet, settings) {
        Ok(result) => {
            debug!(path = %path.display(), images = result.output.len(), "scanned\n{}", result.log);
            for warning in result.log.warnings() {
                sink.emit(warning);
            }
            Some(result)
        }
        Err(e) => {
            sink.emit(e.to_diagnostic());
            None
        }
    };
    Ok(FileScan {
        path: path.to_path_buf(),
        reused: false,
        result,
        diagnostics: sink.take_all(),
        sources,
    })
}

/// Scans `path` inside a cache section keyed by its content and `settings`.
///
/// A valid section hands back the stored result. Otherwise the sheet is
/// analyzed and, if it came out clean, the result is stored. Sheets with
/// diagnostics, warnings included, are never stored so their diagnostics
/// show up again on the next run.
pub fn scan_file_cached(
    path: &Path,
    settings: &ScanSettings,
    cache: &mut CacheManager,
) -> Result<FileScan, PipelineError> {
    let id = cache.begin_file_section(SCAN_CATEGORY, path, settings)?;
    let outcome = scan_in_section(path, settings, cache);
    // The section is closed even when the work inside it failed.
    let ended = cache.end_section(id);
    let scan = outcome?;
    ended?;
    Ok(scan)
}

fn scan_in_section(
    path: &Path,
    settings: &ScanSettings,
    cache: &mut CacheManager,
) -> Result<FileScan, PipelineError> {
    if cache.current_section()?.is_valid() {
        if let Some(result) = read_cached(path, cache)? {
            debug!(path = %path.display(), "reusing cached scan");
            return Ok(FileScan::reused(path, result));
        }
    }

    let scan = analyze(path, settings)?;
    if let (Some(result), true) = (&scan.result, scan.diagnostics.is_empty()) {
        let bytes = serde_json::to_vec(result).map_err(|source| PipelineError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        cache.store_output(SCAN_OUTPUT, &bytes)?;
    }
    Ok(scan)
}

fn read_cached(path: &Path, cache: &CacheManager) -> Result<Option<ScanResult>, PipelineError> {
    let Some(bytes) = cache.read_output(SCAN_OUTPUT)? else {
        return Ok(None);
    };
    match serde_json::from_slice(&bytes) {
        Ok(result) => Ok(Some(result)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cached scan is unreadable, scanning again");
            Ok(None)
        }
    }
}

/// Scans every file in parallel, preserving input order.
///
/// With a cache, each file runs in its own forked manager and all forks
/// are absorbed back before returning.
pub fn scan_files(
    files: &[PathBuf],
    settings: &ScanSettings,
    cache: Option<&mut CacheManager>,
) -> Result<Vec<FileScan>, PipelineError> {
    let Some(cache) = cache else {
        return files.par_iter().map(|f| analyze(f, settings)).collect();
    };

    let parent: &CacheManager = cache;
    let runs: Vec<(Result<FileScan, PipelineError>, CacheManager)> = files
        .par_iter()
        .map(|f| {
            let mut worker = parent.fork();
            let scan = scan_file_cached(f, settings, &mut worker);
            (scan, worker)
        })
        .collect();

    let mut scans = Vec::with_capacity(runs.len());
    let mut first_error = None;
    for (scan, worker) in runs {
        cache.absorb(worker)?;
        match scan {
            Ok(scan) => scans.push(scan),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => warn!(error = %e, "further scan failure"),
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(scans),
    }
}
