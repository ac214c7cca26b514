use anyhow::{bail, Result};
use jwalk::WalkDir;
use std::path::{Path, PathBuf};

/// Find the single annotation XML file under the dataset directory.
///
/// Exactly one `.xml` file (case-insensitive) is expected anywhere below
/// `source_dir`. Zero candidates and multiple candidates are both hard
/// errors; silently picking one of several annotation files would make the
/// extraction depend on traversal order.
pub fn find_annotation_file(source_dir: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = WalkDir::new(source_dir)
        .skip_hidden(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => bail!(
            "No annotation XML file found under {}",
            source_dir.display()
        ),
        1 => Ok(candidates.remove(0)),
        _ => bail!(
            "Ambiguous annotation file: {} XML files found under {}: {}",
            candidates.len(),
            source_dir.display(),
            candidates
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}
