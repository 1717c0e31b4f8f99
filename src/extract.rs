//! Slide content extraction for `.pptx` presentations.
//!
//! Opens the OOXML archive, walks `ppt/slides/slideN.xml` in slide order,
//! and produces one [`SlideRecord`] per slide with the shape text, flattened
//! tables, chart markers, and image markers combined into a single analysis
//! block. Extraction is a collaborator of the pipeline: it returns plain
//! records and never calls the model.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::models::{ElementKind, SlideRecord};

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb
/// protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction error. Fatal for the run; reported at the CLI boundary.
#[derive(Debug)]
pub enum ExtractError {
    SourceNotFound(PathBuf),
    UnsupportedFormat(String),
    Io(String),
    Pptx(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::SourceNotFound(path) => {
                write!(f, "file not found: {}", path.display())
            }
            ExtractError::UnsupportedFormat(ext) => {
                write!(f, "unsupported format: {} (expected .pptx)", ext)
            }
            ExtractError::Io(e) => write!(f, "failed to read presentation: {}", e),
            ExtractError::Pptx(e) => write!(f, "PPTX extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract one [`SlideRecord`] per slide, in presentation order.
pub fn extract_slides(path: &Path) -> Result<Vec<SlideRecord>, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::SourceNotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pptx" {
        return Err(ExtractError::UnsupportedFormat(if ext.is_empty() {
            "(none)".to_string()
        } else {
            format!(".{}", ext)
        }));
    }

    let bytes = std::fs::read(path).map_err(|e| ExtractError::Io(e.to_string()))?;
    extract_slides_from_bytes(&bytes)
}

/// Extract slide records from in-memory `.pptx` bytes.
pub fn extract_slides_from_bytes(bytes: &[u8]) -> Result<Vec<SlideRecord>, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Pptx(e.to_string()))?;

    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut slides = Vec::with_capacity(slide_names.len());
    for (i, name) in slide_names.iter().enumerate() {
        let slide_number = (i + 1) as u32;
        let xml = read_zip_entry_bounded(&mut archive, name, MAX_XML_ENTRY_BYTES)?;
        let elements = parse_slide_elements(&xml)?;
        slides.push(build_record(slide_number, elements));
    }

    Ok(slides)
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Pptx(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Pptx(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Pptx(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

/// One extracted slide element, in document order.
struct Element {
    kind: ElementKind,
    content: String,
}

/// Stream a slide's XML and collect its elements.
///
/// Shapes (`p:sp`) contribute their paragraph text; tables (`a:tbl` inside a
/// graphic frame) are flattened to ` | `-joined rows; chart references and
/// pictures become markers. Text runs (`a:t`) are routed to whichever
/// container is open so table text never leaks into a shape.
fn parse_slide_elements(xml: &[u8]) -> Result<Vec<Element>, ExtractError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut elements = Vec::new();

    let mut shape_text = String::new();
    let mut in_shape = false;

    let mut in_table = false;
    let mut table_rows: Vec<String> = Vec::new();
    let mut row_cells: Vec<String> = Vec::new();
    let mut cell_text = String::new();
    let mut in_cell = false;

    let mut in_text_run = false;

    let mut in_picture = false;
    let mut picture_name: Option<String> = None;

    let mut frame_has_chart = false;
    let mut in_frame = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"sp" => {
                    in_shape = true;
                    shape_text.clear();
                }
                b"graphicFrame" => {
                    in_frame = true;
                    frame_has_chart = false;
                }
                b"tbl" => {
                    in_table = true;
                    table_rows.clear();
                }
                b"tr" if in_table => {
                    row_cells.clear();
                }
                b"tc" if in_table => {
                    in_cell = true;
                    cell_text.clear();
                }
                b"pic" => {
                    in_picture = true;
                    picture_name = None;
                }
                b"cNvPr" if in_picture && picture_name.is_none() => {
                    picture_name = attr_value(&e, b"name");
                }
                b"t" => {
                    in_text_run = true;
                }
                b"chart" if in_frame => {
                    frame_has_chart = true;
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Empty(e)) => match e.local_name().as_ref() {
                b"cNvPr" if in_picture && picture_name.is_none() => {
                    picture_name = attr_value(&e, b"name");
                }
                b"chart" if in_frame => {
                    frame_has_chart = true;
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(t)) if in_text_run => {
                let text = t.unescape().unwrap_or_default();
                if in_cell {
                    cell_text.push_str(&text);
                } else if in_shape {
                    shape_text.push_str(&text);
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => {
                    in_text_run = false;
                }
                b"p" => {
                    // Paragraph break inside whichever container is open.
                    if in_cell {
                        cell_text.push('\n');
                    } else if in_shape {
                        shape_text.push('\n');
                    }
                }
                b"sp" => {
                    in_shape = false;
                    let text = shape_text.trim().to_string();
                    if !text.is_empty() {
                        elements.push(Element {
                            kind: ElementKind::Text,
                            content: text,
                        });
                    }
                }
                b"tc" => {
                    in_cell = false;
                    let text = cell_text.trim().to_string();
                    if !text.is_empty() {
                        row_cells.push(text.replace('\n', " "));
                    }
                }
                b"tr" if in_table => {
                    if !row_cells.is_empty() {
                        table_rows.push(row_cells.join(" | "));
                        row_cells.clear();
                    }
                }
                b"tbl" => {
                    in_table = false;
                    if !table_rows.is_empty() {
                        elements.push(Element {
                            kind: ElementKind::Table,
                            content: table_rows.join("\n"),
                        });
                    }
                }
                b"graphicFrame" => {
                    in_frame = false;
                    if frame_has_chart {
                        elements.push(Element {
                            kind: ElementKind::Chart,
                            content: "[Chart content - data not extractable]".to_string(),
                        });
                    }
                }
                b"pic" => {
                    in_picture = false;
                    let content = match picture_name.take() {
                        Some(name) if !name.is_empty() => format!("[Image: {}]", name),
                        _ => "[Image content]".to_string(),
                    };
                    elements.push(Element {
                        kind: ElementKind::Image,
                        content,
                    });
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Pptx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(elements)
}

fn attr_value(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == key {
            Some(String::from_utf8_lossy(a.value.as_ref()).into_owned())
        } else {
            None
        }
    })
}

/// Combine a slide's elements into one record: text blocks separated by
/// blank lines, tables and charts prefixed with their markers.
fn build_record(slide_number: u32, elements: Vec<Element>) -> SlideRecord {
    let mut content_types: BTreeMap<ElementKind, usize> = BTreeMap::new();
    let mut blocks = Vec::with_capacity(elements.len());

    for element in &elements {
        *content_types.entry(element.kind).or_insert(0) += 1;
        match element.kind {
            ElementKind::Table => blocks.push(format!("[TABLE]\n{}", element.content)),
            ElementKind::Chart => blocks.push(format!("[CHART]\n{}", element.content)),
            _ => blocks.push(element.content.clone()),
        }
    }

    SlideRecord {
        slide_number,
        content: blocks.join("\n\n"),
        content_types,
        total_elements: elements.len(),
    }
}
