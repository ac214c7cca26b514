use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Command-line arguments parser for cutting annotated objects out of a
/// CVAT-style dataset.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Dataset directory containing the annotation XML and an `images` subdirectory
    pub source_directory: PathBuf,

    /// File with class names to extract, separated by newlines and/or semicolons.
    /// If omitted, every annotated object is extracted.
    #[arg(short = 'c', long = "classes")]
    pub classes: Option<PathBuf>,

    /// Directory for the cropped fragments
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short = 't', long = "threads", default_value_t = 1, value_parser = validate_threads)]
    pub threads: usize,
}

// Validate that the thread count is a positive integer
fn validate_threads(s: &str) -> Result<usize, String> {
    match usize::from_str(s) {
        Ok(val) if val >= 1 => Ok(val),
        _ => Err("THREADS must be a positive integer".to_string()),
    }
}

/// Load the class list from a file, splitting rows on newlines and on
/// semicolons with surrounding whitespace trimmed.
///
/// Order is preserved and duplicates are kept; membership testing goes
/// through [`crate::types::ClassFilter`]. `None` yields an empty list,
/// meaning no filtering.
pub fn parse_classes(classes_file: Option<&Path>) -> Result<Vec<String>> {
    let Some(classes_file) = classes_file else {
        return Ok(Vec::new());
    };
    if !classes_file.is_file() {
        bail!("Classes file not found: {}", classes_file.display());
    }
    let content = fs::read_to_string(classes_file)
        .with_context(|| format!("Failed to read classes file: {}", classes_file.display()))?;

    Ok(content
        .lines()
        .flat_map(|row| row.split(';'))
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .map(str::to_string)
        .collect())
}
