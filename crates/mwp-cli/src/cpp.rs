//! C preprocessor invocation
//!
//! The analyzer runs the input through a preprocessor (`gcc -E` by
//! default) before parsing, so headers and macros disappear; the lexer
//! drops the emitted line markers. Preprocessing can be disabled entirely
//! with `--no-cpp`.

use anyhow::{bail, Context, Result};
use log::debug;
use std::path::Path;
use std::process::Command;

/// Preprocess `file` with the given preprocessor binary and arguments,
/// returning the preprocessed source text.
pub fn preprocess(file: &Path, cpp: &str, cpp_args: &str) -> Result<String> {
    let args: Vec<&str> = cpp_args.split_whitespace().collect();
    debug!("running {cpp} {} {}", cpp_args, file.display());
    let output = Command::new(cpp)
        .args(&args)
        .arg(file)
        .output()
        .with_context(|| format!("failed to run preprocessor {cpp:?}"))?;

    if !output.status.success() {
        bail!(
            "preprocessor {cpp} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
