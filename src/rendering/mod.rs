//! Built-in HTML renderer
//!
//! Fetches a document over HTTP(S) or from a `file://` URL, collects its
//! stylesheets, lays it out on fixed-size pages and either rasterizes the
//! pages to PNG or writes them to PDF.

pub mod font;
pub mod layout;
pub mod paint;
pub mod pdf;
pub mod raster;
pub mod style;

use std::time::Duration;

use reqwest::blocking::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::boxes::BoxNode;
use crate::{Error, NavigatorConfig, PageSize, RenderedDocument, Renderer, Result, Stylesheet};
use layout::{layout_document, LayoutOptions};
use style::StyleResolver;

/// Renderer backed by `reqwest`, `scraper` and the layout in this module
pub struct HtmlRenderer {
    client: Client,
    user_agent: String,
    options: LayoutOptions,
}

impl HtmlRenderer {
    pub fn new(config: &NavigatorConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            options: LayoutOptions { page: config.page, margin: config.page_margin },
        })
    }

    pub fn page_size(&self) -> PageSize {
        self.options.page
    }

    /// Fetch `url` and return its body and the URL it was finally served from.
    fn fetch(&self, url: &str) -> Result<(String, String)> {
        let parsed = Url::parse(url).map_err(|e| Error::LoadError(format!("Invalid URL {}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => {
                let resp = self
                    .client
                    .get(parsed.as_str())
                    .header("User-Agent", self.user_agent.clone())
                    .send()
                    .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", url, e)))?
                    .error_for_status()?;
                let final_url = resp.url().to_string();
                let body = resp
                    .text()
                    .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;
                Ok((body, final_url))
            }
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| Error::LoadError(format!("Not a local path: {}", url)))?;
                let body = std::fs::read_to_string(&path)
                    .map_err(|e| Error::LoadError(format!("Failed to read {}: {}", path.display(), e)))?;
                Ok((body, parsed.to_string()))
            }
            other => Err(Error::LoadError(format!("Unsupported URL scheme: {}", other))),
        }
    }

    /// Inline `<style>` blocks and linked stylesheets, in document order.
    ///
    /// A linked sheet that cannot be fetched is skipped with a warning.
    fn author_styles(&self, document: &Html, base_url: Option<&Url>) -> Vec<Stylesheet> {
        let mut styles = Vec::new();
        let Ok(sel) = Selector::parse("style, link[rel~=\"stylesheet\"]") else {
            return styles;
        };
        for node in document.select(&sel) {
            if node.value().name() == "style" {
                let txt = node.text().collect::<String>();
                if !txt.trim().is_empty() {
                    styles.push(Stylesheet::parse(&txt));
                }
                continue;
            }
            let Some(href) = node.value().attr("href") else {
                continue;
            };
            let css_url = match base_url.map(|base| base.join(href)) {
                Some(Ok(u)) => u.to_string(),
                _ => href.to_string(),
            };
            match self.fetch(&css_url) {
                Ok((text, _)) if !text.trim().is_empty() => styles.push(Stylesheet::parse(&text)),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping stylesheet {}: {}", css_url, e),
            }
        }
        styles
    }

    fn layout(&self, html: &str, url: &str, stylesheets: &[Stylesheet]) -> Vec<BoxNode> {
        let document = Html::parse_document(html);
        let base_href = Selector::parse("base[href]").ok().and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|base| base.value().attr("href").map(str::to_string))
        });
        let document_url = Url::parse(url).ok();
        let resolve_base = match (&document_url, &base_href) {
            (Some(doc), Some(href)) => doc.join(href).ok().or_else(|| document_url.clone()),
            _ => document_url.clone(),
        };
        let author = self.author_styles(&document, resolve_base.as_ref());
        let resolver = StyleResolver::new(&author, stylesheets, url, base_href.as_deref());
        let pages = layout_document(&document, &resolver, self.options);
        log::debug!("Laid out {} as {} page(s)", url, pages.len());
        pages
    }

    /// Render already-fetched HTML as if it had been loaded from `url`.
    pub fn render_html(&self, html: &str, url: &str, stylesheets: &[Stylesheet]) -> Result<RenderedDocument> {
        let boxes = self.layout(html, url, stylesheets);
        let rasters = boxes
            .iter()
            .map(|root| raster::rasterize(self.options.page.width, self.options.page.height, &paint::display_list(root)))
            .collect::<Result<Vec<_>>>()?;
        Ok(RenderedDocument { base_url: url.to_string(), rasters, boxes })
    }

    /// Write already-fetched HTML to PDF as if it had been loaded from `url`.
    pub fn pdf_html(&self, html: &str, url: &str, stylesheets: &[Stylesheet]) -> Result<Vec<u8>> {
        let boxes = self.layout(html, url, stylesheets);
        pdf::write_pdf(&boxes, self.options.page)
    }
}

impl Renderer for HtmlRenderer {
    fn render_pages(&self, url: &str, stylesheets: &[Stylesheet]) -> Result<RenderedDocument> {
        let (html, final_url) = self.fetch(url)?;
        log::info!("Rendering {}", final_url);
        self.render_html(&html, &final_url, stylesheets)
    }

    fn write_pdf(&self, url: &str, stylesheets: &[Stylesheet]) -> Result<Vec<u8>> {
        let (html, final_url) = self.fetch(url)?;
        log::info!("Writing PDF for {}", final_url);
        self.pdf_html(&html, &final_url, stylesheets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkKind;

    fn renderer() -> HtmlRenderer {
        let config = NavigatorConfig { page: PageSize { width: 400, height: 300 }, page_margin: 20.0, ..Default::default() };
        HtmlRenderer::new(&config).unwrap()
    }

    #[test]
    fn rasters_and_boxes_line_up() {
        let html = "<p><a href=\"#s1\">jump</a></p><h1 id=\"s1\">Section</h1>";
        let doc = renderer().render_html(html, "http://example.com/", &[]).unwrap();
        assert_eq!(doc.rasters.len(), doc.boxes.len());
        assert_eq!(doc.rasters[0].width, 400);
        assert_eq!(doc.base_url, "http://example.com/");
    }

    #[test]
    fn base_href_changes_link_resolution() {
        let html = "<head><base href=\"http://other.example/dir/\"></head><body><a href=\"x\">x</a></body>";
        let doc = renderer().render_html(html, "http://example.com/", &[]).unwrap();
        let geometry = crate::geometry::extract(&doc.boxes[0]);
        assert_eq!(geometry.links.len(), 1);
        assert_eq!(geometry.links[0].href, "/view/http://other.example/dir/x");
    }

    #[test]
    fn inline_style_blocks_apply() {
        let html = "<style>#t { display: none }</style><p id=\"t\"><a href=\"/a\">gone</a></p>";
        let doc = renderer().render_html(html, "http://example.com/", &[]).unwrap();
        assert!(crate::geometry::extract(&doc.boxes[0]).links.is_empty());
    }

    #[test]
    fn same_document_link_is_internal() {
        let r = renderer();
        let author = Vec::new();
        let resolver = StyleResolver::new(&author, &[], "http://example.com/page", None);
        let link = resolver.resolve_link("http://example.com/page#top").unwrap();
        assert_eq!(link.kind, LinkKind::Internal);
        assert_eq!(r.page_size().width, 400);
    }

    #[test]
    fn unsupported_scheme_is_a_load_error() {
        let err = renderer().render_pages("ftp://example.com/", &[]).unwrap_err();
        assert!(matches!(err, Error::LoadError(_)));
    }

    #[test]
    fn file_urls_are_read_from_disk() {
        let dir = std::env::temp_dir().join(format!("rfnav-render-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("doc.html");
        std::fs::write(&path, "<p>Hello</p>").unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let doc = renderer().render_pages(url.as_str(), &[]).unwrap();
        assert_eq!(doc.boxes.len(), 1);
        let pdf = renderer().write_pdf(url.as_str(), &[]).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
