//! RFox Navigator
//!
//! A browser in your browser: web pages are rendered to paginated PNG images
//! and served as a single scrollable HTML page. The geometry of links and
//! named anchors is recovered from the rendered box tree and laid over the
//! images as transparent, clickable regions, so navigation keeps working.
//! The same document can be exported to PDF.
//!
//! # Example
//!
//! ```no_run
//! use rfnavigator::{assemble, rendering::HtmlRenderer, NavigatorConfig, Stylesheet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = HtmlRenderer::new(&NavigatorConfig::default())?;
//! let stylesheet = Stylesheet::print();
//! let html = assemble::render_template(&renderer, Some("https://example.com"), &[stylesheet])?;
//! println!("{}", String::from_utf8_lossy(&html));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod assemble;
pub mod boxes;
pub mod geometry;
pub mod normalize;
pub mod pages;
pub mod server;
pub mod stylesheet;

// Built-in renderer: fetch, cascade, layout, raster and PDF
pub mod rendering;

pub use boxes::{BoxNode, BoxStyle, Link, LinkKind, Rect};
pub use geometry::{AnchorRecord, LinkRecord, PageGeometry};
pub use pages::Page;
pub use server::Navigator;
pub use stylesheet::Stylesheet;

/// Configuration for the navigator
///
/// The defaults serve on `127.0.0.1:5000` with one worker per CPU and lay
/// documents out on A4 pages at 96dpi.
///
/// # Examples
///
/// ```
/// let cfg = rfnavigator::NavigatorConfig::default();
/// assert_eq!(cfg.port, 5000);
/// assert!(cfg.user_agent.contains("RFOX"));
/// ```
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Address to listen on
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Number of request handling threads
    pub workers: usize,
    /// User agent string sent when fetching documents and stylesheets
    pub user_agent: String,
    /// Timeout for each fetch in milliseconds
    pub timeout_ms: u64,
    /// Page size in px
    pub page: PageSize,
    /// Page margin in px, applied on all four sides
    pub page_margin: f32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            workers: num_cpus::get(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/115.0 RFOX-Navigator/0.1".to_string(),
            timeout_ms: 30000,
            page: PageSize::default(),
            page_margin: 75.0,
        }
    }
}

impl NavigatorConfig {
    /// Reject settings that cannot produce a page.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::ConfigError("workers must be at least 1".into()));
        }
        if self.page.width == 0 || self.page.height == 0 {
            return Err(Error::ConfigError("page size must be non-zero".into()));
        }
        let margins = self.page_margin * 2.0;
        if margins >= self.page.width as f32 || margins >= self.page.height as f32 {
            return Err(Error::ConfigError(format!(
                "page margin {}px leaves no room on a {}x{} page",
                self.page_margin, self.page.width, self.page.height
            )));
        }
        Ok(())
    }
}

/// Page dimensions in px
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for PageSize {
    /// A4 at 96dpi
    fn default() -> Self {
        Self { width: 794, height: 1123 }
    }
}

/// One rasterized page as produced by a renderer
#[derive(Debug, Clone)]
pub struct PageRaster {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

/// The output of a single render pass
///
/// `rasters` and `boxes` are two enumerations of the same pages and must be
/// equal in length; consumers check this before pairing them.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// URL the document was finally loaded from, after redirects
    pub base_url: String,
    pub rasters: Vec<PageRaster>,
    pub boxes: Vec<BoxNode>,
}

/// Core trait for rendering backends
///
/// The navigator only depends on this seam: a renderer turns a URL and a
/// list of stylesheets into page images plus their box trees, or into PDF
/// bytes. Calls block until rendering has finished.
pub trait Renderer {
    /// Lay out and rasterize the document at `url`.
    fn render_pages(&self, url: &str, stylesheets: &[Stylesheet]) -> Result<RenderedDocument>;

    /// Render the document at `url` to PDF bytes.
    fn write_pdf(&self, url: &str, stylesheets: &[Stylesheet]) -> Result<Vec<u8>>;
}
