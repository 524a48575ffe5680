//! `sprig scan`: sprite candidate analysis.
//!
//! 1. Load config and merge CLI overrides
//! 2. Parse and scan every style sheet, reusing cached results
//! 3. Sweep cache entries this run did not use
//! 4. Print the images to assemble and render diagnostics

use std::path::Path;

use serde::Serialize;
use sprig_cache::{CacheContext, CacheManager};
use sprig_diagnostics::{Diagnostic, DiagnosticRenderer, TerminalRenderer};
use sprig_sprite::ImageReference;
use tracing::info;

use crate::pipeline::{load_project_config, merge_scan_settings, scan_files, FileScan};
use crate::{GlobalArgs, ReportFormat, ScanArgs};

/// Per-file entry of the JSON report.
#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a Path,
    reused: bool,
    failed: bool,
    images: &'a [ImageReference],
    diagnostics: &'a [Diagnostic],
}

impl<'a> From<&'a FileScan> for FileReport<'a> {
    fn from(scan: &'a FileScan) -> Self {
        Self {
            path: &scan.path,
            reused: scan.reused,
            failed: scan.failed(),
            images: scan
                .result
                .as_ref()
                .map(|r| r.output.images_to_assemble.as_slice())
                .unwrap_or(&[]),
            diagnostics: &scan.diagnostics,
        }
    }
}

/// Runs the `sprig scan` command.
///
/// Returns exit code 0 if every style sheet validated, 1 otherwise.
pub fn run(args: &ScanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project_config(global)?;
    let settings = merge_scan_settings(&config, args.image_root.as_deref(), &args.ignore);

    let use_cache = config.cache.enabled && !args.no_cache;
    let mut cache = use_cache.then(|| {
        let root = args
            .cache_dir
            .clone()
            .unwrap_or_else(|| config.cache.root.clone());
        info!(root = %root.display(), "using cache");
        CacheManager::new(
            &root,
            CacheContext {
                label: "scan".to_string(),
                ..CacheContext::default()
            },
        )
    });

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!("   Scanning {} style sheet(s)", args.files.len());
    }

    let scans = scan_files(&args.files, &settings, cache.as_mut())?;

    if let Some(cache) = cache.as_mut() {
        if config.cache.sweep && !args.keep_stale {
            let report = cache.clean_up()?;
            info!(removed = report.removed, kept = report.kept, "swept cache");
            if !global.quiet && args.format == ReportFormat::Text && report.removed > 0 {
                eprintln!("   Cache: {report}");
            }
        }
    }

    match args.format {
        ReportFormat::Text => print_text(&scans, global),
        ReportFormat::Json => {
            let reports: Vec<FileReport<'_>> = scans.iter().map(FileReport::from).collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    let failed = scans.iter().filter(|s| s.failed()).count();
    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Result: {} style sheet(s), {} failed",
            scans.len(),
            failed
        );
    }
    Ok(if failed > 0 { 1 } else { 0 })
}

fn print_text(scans: &[FileScan], global: &GlobalArgs) {
    let renderer = TerminalRenderer::new(global.color);
    for scan in scans {
        for diag in &scan.diagnostics {
            eprintln!("{}", renderer.render(diag, &scan.sources));
        }
        let Some(result) = &scan.result else {
            continue;
        };
        let cached = if scan.reused { " (cached)" } else { "" };
        println!(
            "{}: {} image(s) to assemble{cached}",
            scan.path.display(),
            result.output.len()
        );
        for image in &result.output.images_to_assemble {
            let uses = result.output.occurrences(&image.absolute_image_path).len();
            print!("  {}  [{}]", image.absolute_image_path.display(), image.format);
            if let Some(position) = &image.position {
                print!(" at {position}");
            }
            println!(" used by {} rule set(s), first `{}`", uses, image.origin.selector);
        }
    }
}
