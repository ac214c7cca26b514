use anyhow::Result;
use dashmap::DashSet;
use log::info;
use rayon::prelude::*;
use std::path::Path;

use crate::annotation::write_trimmed_annotations;
use crate::crop::{crop_image_boxes, NamingContext};
use crate::types::{AnnotationDocument, ClassFilter, ImageAnnotation, ProcessingStats};
use crate::utils::create_progress_bar;

/// Apply the class filter to every image, keeping document order.
pub fn filter_annotations(doc: &AnnotationDocument, filter: &ClassFilter) -> Vec<ImageAnnotation> {
    doc.images
        .iter()
        .map(|image| ImageAnnotation {
            name: image.name.clone(),
            boxes: image
                .boxes
                .iter()
                .filter(|bbox| filter.matches(&bbox.class_name))
                .cloned()
                .collect(),
        })
        .collect()
}

/// Main dataset processing pipeline.
///
/// Filters the parsed document, crops every retained box into a per-class
/// PNG fragment, and writes the trimmed annotation copy next to the
/// fragments. Images are independent once parsed, so they go through the
/// rayon pool; per-image error context stays with the worker that owns the
/// image.
pub fn process_dataset(
    doc: &AnnotationDocument,
    images_root: &Path,
    output_root: &Path,
    filter: &ClassFilter,
) -> Result<ProcessingStats> {
    let images = filter_annotations(doc, filter);
    info!("Processing {} annotated images...", images.len());

    let pb = create_progress_bar(images.len() as u64, "Crop");
    let created_dirs: DashSet<std::path::PathBuf> = DashSet::new();

    let stats = images
        .par_iter()
        .map(|image| {
            let image_path = images_root.join(&image.name);
            let context = NamingContext::for_image(&image_path);
            let stats =
                crop_image_boxes(&image_path, &image.boxes, output_root, &context, &created_dirs);
            pb.inc(1);
            stats
        })
        .reduce(ProcessingStats::default, ProcessingStats::merge);
    pb.finish_with_message("Cropping complete");

    let trimmed_path = output_root.join("annotations.xml");
    info!("Writing trimmed annotations to {}", trimmed_path.display());
    write_trimmed_annotations(doc.meta_raw.as_deref(), &images, &trimmed_path)?;

    stats.print_summary();
    Ok(stats)
}
