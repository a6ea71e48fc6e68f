//! Result persistence

use anyhow::{Context, Result};
use log::info;
use mwp_core::AnalysisResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Default output location for an input file: `output/<stem>.json`.
pub fn default_file_out(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "result".to_string());
    PathBuf::from("output").join(format!("{stem}.json"))
}

/// Write the analysis result as pretty-printed JSON.
pub fn save_result(path: &Path, result: &AnalysisResult) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let file = fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, result)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("saved result to {}", path.display());
    Ok(())
}
