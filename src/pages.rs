//! Pairing page rasters with their link geometry

use crate::geometry::{self, AnchorRecord, LinkRecord};
use crate::{BoxNode, Error, PageRaster, Renderer, Result, Stylesheet};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// A rendered page ready for assembly
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width: u32,
    pub height: u32,
    /// `data:image/png;base64,...`
    pub image_data_url: String,
    pub links: Vec<LinkRecord>,
    pub anchors: Vec<AnchorRecord>,
}

impl Page {
    /// Build a page from one raster and the box tree of the same page.
    pub fn new(raster: PageRaster, root: &BoxNode) -> Self {
        let geometry = geometry::extract(root);
        Self {
            width: raster.width,
            height: raster.height,
            image_data_url: png_data_url(&raster.png_data),
            links: geometry.links,
            anchors: geometry.anchors,
        }
    }
}

/// Encode PNG bytes as an inline data URL, without line breaks.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Pages of one render pass, produced one at a time
///
/// The iterator consumes the renderer output and cannot be restarted.
pub struct Pages {
    base_url: String,
    rasters: std::vec::IntoIter<PageRaster>,
    boxes: std::vec::IntoIter<BoxNode>,
}

impl Pages {
    /// Pair rasters with box trees, failing if the counts differ.
    pub fn new(document: crate::RenderedDocument) -> Result<Self> {
        if document.rasters.len() != document.boxes.len() {
            return Err(Error::PageMismatch {
                rasters: document.rasters.len(),
                boxes: document.boxes.len(),
            });
        }
        Ok(Self {
            base_url: document.base_url,
            rasters: document.rasters.into_iter(),
            boxes: document.boxes.into_iter(),
        })
    }

    /// URL the document was loaded from, after redirects.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Iterator for Pages {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        let raster = self.rasters.next()?;
        let root = self.boxes.next()?;
        Some(Page::new(raster, &root))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rasters.size_hint()
    }
}

/// Render `url` and return its pages.
pub fn get_pages<R: Renderer + ?Sized>(renderer: &R, url: &str, stylesheets: &[Stylesheet]) -> Result<Pages> {
    let document = renderer.render_pages(url, stylesheets)?;
    log::debug!(
        "Rendered {} into {} page(s)",
        document.base_url,
        document.rasters.len()
    );
    Pages::new(document)
}
