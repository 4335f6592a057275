//! PDF output
//!
//! Writes one PDF page per layout page. Text is set in Courier, which keeps
//! widths close to the monospace layout; backgrounds and underlines are
//! filled rectangles. Links become link annotations: external ones open
//! their URI, internal ones go to the anchor's page and position.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::font::to_ascii;
use super::paint::{display_list, PaintCommand};
use crate::boxes::{BoxNode, LinkKind, Rect, Rgba};
use crate::{Error, PageSize, Result};

/// CSS px to PDF points
const PT_PER_PX: f32 = 0.75;

struct Annotation {
    area: Rect,
    kind: LinkKind,
    target: String,
}

/// Encode laid-out pages as a PDF document.
pub fn write_pdf(pages: &[BoxNode], size: PageSize) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let page_ids: Vec<ObjectId> = pages.iter().map(|_| doc.new_object_id()).collect();
    let height_pt = size.height as f32 * PT_PER_PX;

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut anchors: HashMap<String, (ObjectId, f32, f32)> = HashMap::new();
    let mut annotations: Vec<Vec<Annotation>> = Vec::with_capacity(pages.len());
    for (root, page_id) in pages.iter().zip(&page_ids) {
        let mut page_annots = Vec::new();
        collect_targets(root, *page_id, &mut page_annots, &mut anchors);
        annotations.push(page_annots);
    }

    for ((root, page_id), page_annots) in pages.iter().zip(&page_ids).zip(annotations) {
        let content = Content { operations: content_operations(&display_list(root), height_pt) };
        let encoded = content
            .encode()
            .map_err(|e| Error::PdfError(format!("Failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let annots: Vec<Object> = page_annots
            .iter()
            .filter_map(|a| link_annotation(a, height_pt, &anchors))
            .map(|annot| doc.add_object(annot).into())
            .collect();

        doc.objects.insert(
            *page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), Object::Real(size.width as f32 * PT_PER_PX), Object::Real(height_pt)],
                "Contents" => content_id,
                "Resources" => Object::Dictionary(dictionary! {
                    "Font" => Object::Dictionary(dictionary! {
                        "F1" => font_id,
                    }),
                }),
                "Annots" => annots,
            }),
        );
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::from(*id)).collect::<Vec<_>>(),
            "Count" => page_ids.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| Error::PdfError(format!("Failed to write PDF: {}", e)))?;
    Ok(buf)
}

fn collect_targets(
    node: &BoxNode,
    page_id: ObjectId,
    annots: &mut Vec<Annotation>,
    anchors: &mut HashMap<String, (ObjectId, f32, f32)>,
) {
    let style = node.style();
    let area = node.area();
    if let Some(link) = style.link.as_ref().filter(|_| !node.is_leaf()) {
        annots.push(Annotation { area, kind: link.kind, target: link.target.clone() });
    }
    if let Some(name) = &style.anchor {
        anchors.entry(name.clone()).or_insert((page_id, area.x, area.y));
    }
    for child in node.children() {
        collect_targets(child, page_id, annots, anchors);
    }
}

fn link_annotation(a: &Annotation, height_pt: f32, anchors: &HashMap<String, (ObjectId, f32, f32)>) -> Option<Object> {
    let x1 = a.area.x * PT_PER_PX;
    let x2 = a.area.right() * PT_PER_PX;
    let y1 = height_pt - a.area.bottom() * PT_PER_PX;
    let y2 = height_pt - a.area.y * PT_PER_PX;
    let mut annot = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![Object::Real(x1), Object::Real(y1), Object::Real(x2), Object::Real(y2)],
        "Border" => vec![0.into(), 0.into(), 0.into()],
    };
    match a.kind {
        LinkKind::External => {
            annot.set(
                "A",
                dictionary! {
                    "S" => "URI",
                    "URI" => Object::string_literal(a.target.as_str()),
                },
            );
        }
        LinkKind::Internal => {
            let (page_id, x, y) = anchors.get(&a.target)?;
            let dest: Vec<Object> = vec![
                Object::from(*page_id),
                "XYZ".into(),
                Object::Real(x * PT_PER_PX),
                Object::Real(height_pt - y * PT_PER_PX),
                Object::Null,
            ];
            annot.set(
                "A",
                dictionary! {
                    "S" => "GoTo",
                    "D" => dest,
                },
            );
        }
    }
    Some(Object::Dictionary(annot))
}

fn fill_color(rgba: Rgba) -> Operation {
    let c = |v: u8| Object::Real(v as f32 / 255.0);
    Operation::new("rg", vec![c(rgba.0), c(rgba.1), c(rgba.2)])
}

fn content_operations(commands: &[PaintCommand], height_pt: f32) -> Vec<Operation> {
    let mut ops = Vec::new();
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                if rgba.3 == 0 {
                    continue;
                }
                let h = *height as f32 * PT_PER_PX;
                ops.push(fill_color(*rgba));
                ops.push(Operation::new(
                    "re",
                    vec![
                        Object::Real(*x as f32 * PT_PER_PX),
                        Object::Real(height_pt - *y as f32 * PT_PER_PX - h),
                        Object::Real(*width as f32 * PT_PER_PX),
                        Object::Real(h),
                    ],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            PaintCommand::Text { x, y, text, font_size, rgba, .. } => {
                let size = font_size * PT_PER_PX;
                // baseline sits at roughly 80% of the em box
                let baseline = height_pt - (*y as f32 + font_size * 0.8) * PT_PER_PX;
                ops.push(fill_color(*rgba));
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("Tf", vec!["F1".into(), Object::Real(size)]));
                ops.push(Operation::new(
                    "Td",
                    vec![Object::Real(*x as f32 * PT_PER_PX), Object::Real(baseline)],
                ));
                ops.push(Operation::new("Tj", vec![Object::string_literal(to_ascii(text).into_owned())]));
                ops.push(Operation::new("ET", vec![]));
            }
        }
    }
    ops
}
