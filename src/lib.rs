//! CVAT annotation to image-fragment converter
//!
//! This library converts a CVAT-style video-annotation dataset (one XML
//! annotation file plus a directory of extracted frame images) into cropped
//! PNG fragments, one per annotated object instance, organized by class label.

pub mod annotation;
pub mod config;
pub mod crop;
pub mod dataset;
pub mod locate;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use annotation::{parse_annotation_file, parse_annotations, write_trimmed_annotations};
pub use config::{parse_classes, Args};
pub use crop::{crop_image_boxes, fragment_path, NamingContext};
pub use dataset::{filter_annotations, process_dataset};
pub use locate::find_annotation_file;
pub use types::{AnnotationDocument, BoundBox, ClassFilter, ImageAnnotation, ProcessingStats};
