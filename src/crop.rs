use anyhow::{bail, Context, Result};
use dashmap::DashSet;
use image::{DynamicImage, GenericImageView};
use log::{error, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{BoundBox, ProcessingStats};

/// Naming context for the fragments cut out of one frame.
///
/// `context_dir` is the leading component of every fragment name and `stem`
/// identifies the frame itself. For discrete frame files the stem is the
/// file name without extension; for frames decoded straight out of a video
/// it is synthesized from the video stem and the frame number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingContext {
    pub context_dir: String,
    pub stem: String,
}

impl NamingContext {
    /// Context for a discrete frame file: the parent directory name plus
    /// the file stem.
    pub fn for_image(image_path: &Path) -> Self {
        let context_dir = image_path
            .parent()
            .and_then(|parent| parent.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = image_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { context_dir, stem }
    }

    /// Context for a frame taken out of a video file rather than a discrete
    /// image on disk.
    pub fn for_video_frame(context_dir: &str, video_path: &Path, frame_number: u64) -> Self {
        let video_stem = video_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            context_dir: context_dir.to_string(),
            stem: format!("{}_{}", video_stem, frame_number),
        }
    }
}

/// Compute the deterministic output path for one fragment:
/// `output_root/<class>/<context>_<stem>_<x>_<y>.png`.
pub fn fragment_path(output_root: &Path, bbox: &BoundBox, context: &NamingContext) -> PathBuf {
    let file_name = sanitize_filename::sanitize(format!(
        "{}_{}_{}_{}.png",
        context.context_dir, context.stem, bbox.x, bbox.y
    ));
    output_root
        .join(sanitize_filename::sanitize(&bbox.class_name))
        .join(file_name)
}

/// Crop every box of one frame image into its own PNG fragment.
///
/// A missing or unreadable frame file skips the whole image; a box that is
/// not strictly positive or not fully inside the image skips just that box.
/// Neither aborts the run.
pub fn crop_image_boxes(
    image_path: &Path,
    boxes: &[BoundBox],
    output_root: &Path,
    context: &NamingContext,
    created_dirs: &DashSet<PathBuf>,
) -> ProcessingStats {
    let mut stats = ProcessingStats::default();
    if boxes.is_empty() {
        stats.images_processed += 1;
        return stats;
    }

    if !image_path.exists() {
        warn!("Frame image not found, skipping: {}", image_path.display());
        stats.images_skipped_missing += 1;
        return stats;
    }
    let image = match image::open(image_path) {
        Ok(image) => image,
        Err(e) => {
            warn!(
                "Failed to decode frame image {}, skipping: {}",
                image_path.display(),
                e
            );
            stats.images_skipped_missing += 1;
            return stats;
        }
    };

    for bbox in boxes {
        match crop_fragment(&image, bbox, output_root, context, created_dirs) {
            Ok(()) => stats.fragments_written += 1,
            Err(e) => {
                error!(
                    "Failed to cut box from {} ({}x{}): {:#}",
                    image_path.display(),
                    image.width(),
                    image.height(),
                    e
                );
                stats.boxes_failed += 1;
            }
        }
    }

    stats.images_processed += 1;
    stats
}

fn crop_fragment(
    image: &DynamicImage,
    bbox: &BoundBox,
    output_root: &Path,
    context: &NamingContext,
    created_dirs: &DashSet<PathBuf>,
) -> Result<()> {
    let (image_width, image_height) = image.dimensions();
    if bbox.width <= 0
        || bbox.height <= 0
        || bbox.x < 0
        || bbox.y < 0
        || bbox.right() > i64::from(image_width)
        || bbox.bottom() > i64::from(image_height)
    {
        bail!(
            "Box {:?} is outside the image bounds or degenerate",
            bbox
        );
    }

    let output_path = fragment_path(output_root, bbox, context);
    if let Some(class_dir) = output_path.parent() {
        if !created_dirs.contains(class_dir) {
            fs::create_dir_all(class_dir)
                .with_context(|| format!("Failed to create class directory: {}", class_dir.display()))?;
            created_dirs.insert(class_dir.to_path_buf());
        }
    }

    let fragment = image.crop_imm(
        bbox.x as u32,
        bbox.y as u32,
        bbox.width as u32,
        bbox.height as u32,
    );
    if let Err(e) = fragment.save(&output_path) {
        // Remove whatever the failed save left behind
        let _ = fs::remove_file(&output_path);
        return Err(e).with_context(|| format!("Failed to save fragment: {}", output_path.display()));
    }
    Ok(())
}
