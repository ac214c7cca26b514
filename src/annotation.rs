use anyhow::{bail, Context, Result};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::types::{AnnotationDocument, BoundBox, ImageAnnotation};

/// Parse a CVAT annotation XML file into an [`AnnotationDocument`].
pub fn parse_annotation_file(path: &Path) -> Result<AnnotationDocument> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read annotation file: {}", path.display()))?;
    parse_annotations(&content)
        .with_context(|| format!("Failed to parse annotation XML: {}", path.display()))
}

/// Parse an annotation document from an XML string.
///
/// The root element must be `annotations` (case-insensitive). The `meta`
/// subtree is captured verbatim; every `image` element contributes its `box`
/// children as [`BoundBox`] values. A non-numeric coordinate attribute fails
/// the whole parse.
pub fn parse_annotations(xml: &str) -> Result<AnnotationDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = AnnotationDocument::default();
    let mut root_seen = false;
    let mut current: Option<ImageAnnotation> = None;

    loop {
        match reader.read_event().context("Malformed XML")? {
            Event::Start(e) => {
                if !root_seen {
                    if !e.name().as_ref().eq_ignore_ascii_case(b"annotations") {
                        bail!(
                            "Unexpected root element '{}', expected 'annotations'",
                            String::from_utf8_lossy(e.name().as_ref())
                        );
                    }
                    root_seen = true;
                    continue;
                }
                match e.name().as_ref() {
                    b"meta" => {
                        let raw = reader.read_text(e.name()).context("Malformed meta element")?;
                        doc.meta_raw = Some(raw.into_owned());
                    }
                    b"image" => current = Some(parse_image_element(&e)?),
                    b"box" => {
                        if let Some(image) = current.as_mut() {
                            image.boxes.push(parse_box_element(&e)?);
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if !root_seen {
                    // An empty self-closing root is a valid document with no images
                    if !e.name().as_ref().eq_ignore_ascii_case(b"annotations") {
                        bail!(
                            "Unexpected root element '{}', expected 'annotations'",
                            String::from_utf8_lossy(e.name().as_ref())
                        );
                    }
                    root_seen = true;
                    continue;
                }
                match e.name().as_ref() {
                    b"image" => doc.images.push(parse_image_element(&e)?),
                    b"box" => {
                        if let Some(image) = current.as_mut() {
                            image.boxes.push(parse_box_element(&e)?);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"image" {
                    if let Some(image) = current.take() {
                        doc.images.push(image);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        bail!("Annotation XML has no root element");
    }
    Ok(doc)
}

fn parse_image_element(e: &BytesStart) -> Result<ImageAnnotation> {
    for attr in e.attributes() {
        let attr = attr.context("Malformed image attribute")?;
        if attr.key.local_name().as_ref() == b"name" {
            return Ok(ImageAnnotation {
                name: attr.unescape_value()?.into_owned(),
                boxes: Vec::new(),
            });
        }
    }
    bail!("Image element is missing the 'name' attribute");
}

fn parse_box_element(e: &BytesStart) -> Result<BoundBox> {
    let mut label = None;
    let (mut xtl, mut ytl, mut xbr, mut ybr) = (None, None, None, None);

    for attr in e.attributes() {
        let attr = attr.context("Malformed box attribute")?;
        match attr.key.local_name().as_ref() {
            b"label" => label = Some(attr.unescape_value()?.into_owned()),
            b"xtl" => xtl = Some(parse_coordinate(&attr, "xtl")?),
            b"ytl" => ytl = Some(parse_coordinate(&attr, "ytl")?),
            b"xbr" => xbr = Some(parse_coordinate(&attr, "xbr")?),
            b"ybr" => ybr = Some(parse_coordinate(&attr, "ybr")?),
            _ => {}
        }
    }

    match (label, xtl, ytl, xbr, ybr) {
        (Some(label), Some(xtl), Some(ytl), Some(xbr), Some(ybr)) => {
            Ok(BoundBox::from_corners(label, xtl, ytl, xbr, ybr))
        }
        _ => bail!("Box element is missing one of 'label', 'xtl', 'ytl', 'xbr', 'ybr'"),
    }
}

fn parse_coordinate(attr: &Attribute, name: &str) -> Result<f64> {
    let value = attr.unescape_value()?;
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Failed to parse {} coordinate: {}", name, value))
}

/// Serialize the trimmed annotation document: XML declaration, root
/// `annotations`, the original `meta` subtree replayed verbatim, then each
/// image with only its retained boxes (coordinates rewritten as the
/// truncated integers actually used for cropping).
pub fn write_trimmed_annotations(
    meta_raw: Option<&str>,
    images: &[ImageAnnotation],
    path: &Path,
) -> Result<()> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("annotations")))?;

    if let Some(meta_raw) = meta_raw {
        writer.write_event(Event::Start(BytesStart::new("meta")))?;
        writer.get_mut().write_all(meta_raw.as_bytes())?;
        writer.write_event(Event::End(BytesEnd::new("meta")))?;
    }

    for image in images {
        let mut image_elem = BytesStart::new("image");
        image_elem.push_attribute(("name", image.name.as_str()));
        writer.write_event(Event::Start(image_elem))?;
        for bbox in &image.boxes {
            let mut box_elem = BytesStart::new("box");
            box_elem.push_attribute(("label", bbox.class_name.as_str()));
            box_elem.push_attribute(("xtl", bbox.x.to_string().as_str()));
            box_elem.push_attribute(("ytl", bbox.y.to_string().as_str()));
            box_elem.push_attribute(("xbr", bbox.right().to_string().as_str()));
            box_elem.push_attribute(("ybr", bbox.bottom().to_string().as_str()));
            writer.write_event(Event::Empty(box_elem))?;
        }
        writer.write_event(Event::End(BytesEnd::new("image")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("annotations")))?;
    fs::write(path, writer.into_inner())
        .with_context(|| format!("Failed to write trimmed annotations: {}", path.display()))
}
