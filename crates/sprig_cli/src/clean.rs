//! `sprig clean`: removes the build cache directory.

use tracing::info;

use crate::pipeline::load_project_config;
use crate::{CleanArgs, GlobalArgs};

/// Runs the `sprig clean` command.
pub fn run(args: &CleanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = match args.cache_dir {
        Some(ref dir) => dir.clone(),
        None => load_project_config(global)?.cache.root,
    };

    if !root.exists() {
        if !global.quiet {
            eprintln!("   Nothing to clean at {}", root.display());
        }
        return Ok(0);
    }

    std::fs::remove_dir_all(&root)
        .map_err(|e| format!("cannot remove {}: {e}", root.display()))?;
    info!(root = %root.display(), "removed cache directory");
    if !global.quiet {
        eprintln!("   Removed {}", root.display());
    }
    Ok(0)
}
