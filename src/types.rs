use std::collections::HashSet;

/// One annotated object instance within a single frame.
///
/// Coordinates come from the CVAT two-corner representation: the float
/// attributes are truncated toward zero and the extents derived as
/// `bottom_right - top_left`. Extents can end up zero or negative for
/// degenerate source data; the cropping step rejects those per box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundBox {
    pub class_name: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BoundBox {
    /// Build a box from CVAT `xtl`/`ytl`/`xbr`/`ybr` corner coordinates.
    pub fn from_corners(class_name: String, xtl: f64, ytl: f64, xbr: f64, ybr: f64) -> Self {
        let x = xtl as i64;
        let y = ytl as i64;
        Self {
            class_name,
            x,
            y,
            width: xbr as i64 - x,
            height: ybr as i64 - y,
        }
    }

    /// Exclusive right edge of the crop rectangle.
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    /// Exclusive bottom edge of the crop rectangle.
    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }
}

// One `image` element: the frame file it names plus its boxes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAnnotation {
    pub name: String,
    pub boxes: Vec<BoundBox>,
}

/// The parsed annotation document.
///
/// `meta_raw` holds the verbatim inner XML of the `meta` element so the
/// trimmed output document can replay it unchanged.
#[derive(Debug, Clone, Default)]
pub struct AnnotationDocument {
    pub meta_raw: Option<String>,
    pub images: Vec<ImageAnnotation>,
}

/// The set of class labels to retain during extraction.
///
/// An empty class list means no filtering: every box is retained.
#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    classes: Option<HashSet<String>>,
}

impl ClassFilter {
    pub fn from_classes(classes: &[String]) -> Self {
        if classes.is_empty() {
            Self { classes: None }
        } else {
            Self {
                classes: Some(classes.iter().cloned().collect()),
            }
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        match &self.classes {
            Some(classes) => classes.contains(label),
            None => true,
        }
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub images_processed: usize,
    pub images_skipped_missing: usize,
    pub fragments_written: usize,
    pub boxes_failed: usize,
}

impl ProcessingStats {
    pub fn merge(mut self, other: Self) -> Self {
        self.images_processed += other.images_processed;
        self.images_skipped_missing += other.images_skipped_missing;
        self.fragments_written += other.fragments_written;
        self.boxes_failed += other.boxes_failed;
        self
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Images processed: {}", self.images_processed);
        log::info!("Fragments written: {}", self.fragments_written);
        log::info!(
            "Skipped (missing frame image): {}",
            self.images_skipped_missing
        );
        log::info!("Failed boxes: {}", self.boxes_failed);

        if self.images_skipped_missing > 0 || self.boxes_failed > 0 {
            log::warn!(
                "Incomplete extraction: {} missing frame images, {} failed boxes",
                self.images_skipped_missing,
                self.boxes_failed
            );
        }
    }
}
