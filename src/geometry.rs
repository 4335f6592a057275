//! Link and anchor extraction from a rendered page
//!
//! Walks a page's box tree in pre-order and records every clickable link
//! region and every named anchor together with its hit area.

use crate::boxes::{BoxNode, LinkKind};
use serde::Serialize;

/// A clickable region and where it navigates to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    /// Either `#name` (same document) or `/view/<url>` (another document)
    pub href: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A named position in the document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorRecord {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Links and anchors of one page, in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageGeometry {
    pub links: Vec<LinkRecord>,
    pub anchors: Vec<AnchorRecord>,
}

/// Collect links and anchors of `root` and its descendants.
pub fn extract(root: &BoxNode) -> PageGeometry {
    let mut geometry = PageGeometry::default();
    find_links(root, &mut geometry.links, &mut geometry.anchors);
    geometry
}

/// Append the links and anchors of `node`'s subtree to the given vectors.
pub fn find_links(node: &BoxNode, links: &mut Vec<LinkRecord>, anchors: &mut Vec<AnchorRecord>) {
    let style = node.style();
    let (x, y, width, height) = node.hit_area();

    // `link` is inherited, so text leaves repeat their container's value
    if let Some(link) = style.link.as_ref().filter(|_| !node.is_leaf()) {
        let href = match link.kind {
            LinkKind::Internal => format!("#{}", link.target),
            LinkKind::External => format!("/view/{}", link.target),
        };
        links.push(LinkRecord { href, x, y, width, height });
    }

    if let Some(name) = &style.anchor {
        anchors.push(AnchorRecord { name: name.clone(), x, y, width, height });
    }

    for child in node.children() {
        find_links(child, links, anchors);
    }
}
