//! Highlight and outline marks over located values.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, dictionary};
use tracing::{debug, info, warn};

use super::Result;
use super::geometry::{PageGeometry, TextHit};
use crate::error::PdfError;
use crate::models::config::AnnotationConfig;
use crate::models::po::{FieldKey, PoRecord};

const AUTHOR: &str = "pox";

/// How a located value is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    /// Filled highlight, used for header field values.
    Highlight,
    /// Rectangle outline, used for line-item descriptions.
    Outline,
}

/// A value to find and mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTarget {
    /// Column the value came from, written into the annotation contents.
    pub label: String,
    pub value: String,
    pub kind: MarkKind,
}

impl AnnotationTarget {
    /// Targets for one record: found header values, then item descriptions.
    pub fn from_record(record: &PoRecord) -> Vec<Self> {
        let headers = record
            .fields
            .iter()
            .filter(|(_, value)| *value != crate::models::po::NOT_FOUND)
            .map(|(key, value)| Self {
                label: key.to_string(),
                value: value.to_string(),
                kind: MarkKind::Highlight,
            });

        let items = record
            .line_items
            .iter()
            .filter(|item| !item.description.trim().is_empty())
            .map(|item| Self {
                label: "Description".to_string(),
                value: item.description.clone(),
                kind: MarkKind::Outline,
            });

        headers.chain(items).collect()
    }

    pub fn header(key: FieldKey, value: impl Into<String>) -> Self {
        Self {
            label: key.to_string(),
            value: value.into(),
            kind: MarkKind::Highlight,
        }
    }
}

/// Result of an annotation pass.
#[derive(Debug, Clone)]
pub struct AnnotationOutcome {
    /// The output document. An unmodified copy of the input when
    /// `applied` is false.
    pub document: Vec<u8>,
    /// Number of marks drawn.
    pub marks: usize,
    /// Values that were not found on any page.
    pub misses: Vec<String>,
    pub applied: bool,
}

impl AnnotationOutcome {
    /// The input unchanged, nothing drawn.
    pub fn unmodified(document: &[u8]) -> Self {
        Self {
            document: document.to_vec(),
            marks: 0,
            misses: Vec::new(),
            applied: false,
        }
    }
}

/// Draws annotations onto a copy of a PDF.
pub struct Annotator {
    highlight_color: [f32; 3],
    outline_color: [f32; 3],
}

impl Annotator {
    pub fn new() -> Self {
        Self::from_config(&AnnotationConfig::default())
    }

    pub fn from_config(config: &AnnotationConfig) -> Self {
        Self {
            highlight_color: config.highlight_color,
            outline_color: config.outline_color,
        }
    }

    /// Mark every occurrence of every target.
    ///
    /// Never fails: when the document cannot be read or written the
    /// outcome carries a copy of the input and `applied == false`.
    pub fn annotate(&self, document: &[u8], targets: &[AnnotationTarget]) -> AnnotationOutcome {
        match self.try_annotate(document, targets) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Annotation failed, returning unmodified document: {}", e);
                AnnotationOutcome::unmodified(document)
            }
        }
    }

    /// Like [`annotate`](Self::annotate) but surfaces failures.
    pub fn try_annotate(
        &self,
        document: &[u8],
        targets: &[AnnotationTarget],
    ) -> Result<AnnotationOutcome> {
        let mut doc = Document::load_mem(document)?;
        if doc.is_encrypted() {
            doc.decrypt("").map_err(|_| PdfError::Encrypted)?;
        }

        let geometry = PageGeometry::from_document(&doc)?;
        let pages = doc.get_pages();

        let mut marks = 0;
        let mut misses = Vec::new();

        for target in targets {
            let hits = geometry.locate(&target.value);
            if hits.is_empty() {
                debug!("No on-page match for {} {:?}", target.label, target.value);
                misses.push(target.value.clone());
                continue;
            }

            for hit in &hits {
                let Some(&page_id) = pages.get(&hit.page) else {
                    continue;
                };
                let annot = self.annotation(target, hit);
                let annot_id = doc.add_object(annot);
                attach(&mut doc, page_id, annot_id)?;
                marks += 1;
            }
        }

        if !misses.is_empty() {
            warn!("{} annotation values not found on any page: {:?}", misses.len(), misses);
        }
        info!("Drew {} annotation marks", marks);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| PdfError::Annotation(e.to_string()))?;

        Ok(AnnotationOutcome {
            document: out,
            marks,
            misses,
            applied: true,
        })
    }

    fn annotation(&self, target: &AnnotationTarget, hit: &TextHit) -> Dictionary {
        let contents = Object::String(
            format!("{}: {}", target.label, target.value).into_bytes(),
            StringFormat::Literal,
        );

        match target.kind {
            MarkKind::Highlight => dictionary! {
                "Type" => "Annot",
                "Subtype" => "Highlight",
                "Rect" => hit.rect.to_object(),
                "QuadPoints" => hit.rect.to_quad_points(),
                "C" => color(self.highlight_color),
                "F" => 4,
                "T" => Object::string_literal(AUTHOR),
                "Contents" => contents,
            },
            MarkKind::Outline => dictionary! {
                "Type" => "Annot",
                "Subtype" => "Square",
                "Rect" => hit.rect.to_object(),
                "C" => color(self.outline_color),
                "BS" => dictionary! { "W" => 1 },
                "F" => 4,
                "T" => Object::string_literal(AUTHOR),
                "Contents" => contents,
            },
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

fn color(rgb: [f32; 3]) -> Object {
    Object::Array(rgb.into_iter().map(Object::Real).collect())
}

/// Append an annotation reference to a page's `Annots`, which may be
/// absent, inline, or an indirect array.
fn attach(doc: &mut Document, page_id: ObjectId, annot_id: ObjectId) -> Result<()> {
    let annots_ref = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    if let Some(array_id) = annots_ref {
        let array = doc
            .get_object_mut(array_id)
            .and_then(Object::as_array_mut)
            .map_err(|e| PdfError::Annotation(format!("bad Annots array: {}", e)))?;
        array.push(Object::Reference(annot_id));
        return Ok(());
    }

    let page = doc.get_dictionary_mut(page_id)?;
    match page.get_mut(b"Annots") {
        Ok(Object::Array(array)) => array.push(Object::Reference(annot_id)),
        _ => page.set("Annots", vec![Object::Reference(annot_id)]),
    }
    Ok(())
}
