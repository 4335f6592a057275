//! Assembling rendered pages into a navigable HTML document
//!
//! Each page becomes a positioned `<section>` holding its image. Links are
//! laid over the image as transparent, absolutely positioned `<a href>`
//! elements with the exact hit area of the rendered box, and anchors become
//! `<a name>` elements so `#fragment` navigation works inside the page.

use crate::pages::{self, Page};
use crate::{Renderer, Result, Stylesheet};
use html_escape::encode_double_quoted_attribute as attr;

/// Height of the fixed navigation bar. Anchors are moved up by this much so
/// that jumping to `#name` lands below the bar. Must follow the `form` and
/// `body` rules in [`HEAD`].
pub const ANCHOR_OFFSET_PX: f32 = 60.0;

const HEAD: &str = r#"<!doctype html>
<meta charset=utf-8>
<title>RFox Navigator</title>
<style>
  form { position: fixed; z-index: 1; top: 8px; left: 16px; right: 0; }
  input { font: 24px/30px sans-serif }
  input:not([type]) { background: rgba(255, 255, 255, .9); border-width: 2px;
                      border-radius: 6px; padding: 0 3px }
  input:not([type]):focus { outline: none }
  body { margin-top: 0; padding-top: 50px }
  section { box-shadow: 0 0 10px 2px #aaa; margin: 25px; position: relative }
  section a { position: absolute; display: block }
  section a[href]:hover, a[href]:focus { outline: 1px dotted }
</style>
<body onload="var u=document.forms[0].url; u.value || u.focus()">
<form action="/" onsubmit="
  window.location.href = '/view/' + this.url.value; return false;">
<input name=url style="width: 80%" placeholder="Enter an URL to start"
  value=""#;

/// Build the HTML document for `url` and its pages.
///
/// With no URL only the navigation form is emitted and `pages` is ignored.
pub fn assemble<I>(url: Option<&str>, pages: I) -> Vec<u8>
where
    I: IntoIterator<Item = Page>,
{
    let mut out = String::from(HEAD);
    write_body(&mut out, url, pages);
    out.into_bytes()
}

fn write_body<I>(out: &mut String, url: Option<&str>, pages: I)
where
    I: IntoIterator<Item = Page>,
{
    if let Some(url) = url {
        out.push_str(&attr(url));
    }
    out.push_str("\" />\n<input type=submit value=Go />\n");
    let Some(url) = url else {
        out.push_str("</form>\n");
        return;
    };
    out.push_str(&format!("<a href=\"/pdf/{}\">PDF</a>\n", attr(url)));
    out.push_str("</form>\n");

    for page in pages {
        write_section(out, &page);
    }
}

fn write_section(out: &mut String, page: &Page) {
    out.push_str(&format!(
        "<section style=\"width: {}px; height: {}px\">\n  <img src=\"{}\">\n",
        page.width, page.height, page.image_data_url
    ));
    for link in &page.links {
        out.push_str(&format!(
            "  <a style=\"left: {}px; top: {}px; width: {}px; height: {}px\" href=\"{}\"></a>\n",
            link.x,
            link.y,
            link.width,
            link.height,
            attr(&link.href)
        ));
    }
    for anchor in &page.anchors {
        out.push_str(&format!(
            "  <a style=\"left: {}px; top: {}px;\" name=\"{}\"></a>\n",
            anchor.x,
            anchor.y - ANCHOR_OFFSET_PX,
            attr(&anchor.name)
        ));
    }
    out.push_str("</section>\n");
}

/// Render `url` with `renderer` and assemble the result.
///
/// The displayed URL is the one the document was finally loaded from. All
/// pages are consumed before returning; a renderer failure returns an error
/// and no output.
pub fn render_template<R: Renderer + ?Sized>(
    renderer: &R,
    url: Option<&str>,
    stylesheets: &[Stylesheet],
) -> Result<Vec<u8>> {
    let Some(url) = url else {
        return Ok(assemble(None, std::iter::empty()));
    };
    let pages = pages::get_pages(renderer, url, stylesheets)?;
    let base_url = pages.base_url().to_string();
    Ok(assemble(Some(&base_url), pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnchorRecord, LinkRecord};

    fn page() -> Page {
        Page {
            width: 794,
            height: 1123,
            image_data_url: "data:image/png;base64,AAAA".into(),
            links: vec![LinkRecord { href: "#sec1".into(), x: 10.0, y: 20.0, width: 100.0, height: 30.0 }],
            anchors: vec![AnchorRecord { name: "sec1".into(), x: 0.0, y: 200.0, width: 50.0, height: 10.0 }],
        }
    }

    #[test]
    fn empty_url_gives_bare_form() {
        let html = String::from_utf8(assemble(None, vec![page()])).unwrap();
        assert!(html.contains("<form action=\"/\""));
        assert!(html.contains("value=\"\" />"));
        assert!(!html.contains("<section"));
        assert!(!html.contains("PDF</a>"));
    }

    #[test]
    fn pages_become_sections_with_overlays() {
        let html = String::from_utf8(assemble(Some("http://a.example/"), vec![page(), page()])).unwrap();
        assert!(html.contains("value=\"http://a.example/\" />"));
        assert!(html.contains("<a href=\"/pdf/http://a.example/\">PDF</a>"));
        assert_eq!(html.matches("<section style=\"width: 794px; height: 1123px\">").count(), 2);
        assert!(html.contains("<img src=\"data:image/png;base64,AAAA\">"));
        assert!(html.contains(
            "<a style=\"left: 10px; top: 20px; width: 100px; height: 30px\" href=\"#sec1\"></a>"
        ));
        assert!(html.contains("<a style=\"left: 0px; top: 140px;\" name=\"sec1\"></a>"));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut p = page();
        p.links[0].href = "/view/http://x.com/?a=\"b\"".into();
        let html = String::from_utf8(assemble(Some("http://x.com/\"><script>"), vec![p])).unwrap();
        assert!(!html.contains("\"><script>"));
        assert!(html.contains("&quot;b&quot;"));
    }

    #[test]
    fn fractional_geometry_is_kept() {
        let mut p = page();
        p.links[0].x = 12.5;
        let html = String::from_utf8(assemble(Some("http://a/"), vec![p])).unwrap();
        assert!(html.contains("left: 12.5px"));
    }

    #[test]
    fn body_after_head_is_complete() {
        let html = String::from_utf8(assemble(Some("http://a/"), vec![page()])).unwrap();
        let body = html.strip_prefix(HEAD).unwrap();
        assert_eq!(
            body,
            "http://a/\" />\n<input type=submit value=Go />\n\
             <a href=\"/pdf/http://a/\">PDF</a>\n</form>\n\
             <section style=\"width: 794px; height: 1123px\">\n  <img src=\"data:image/png;base64,AAAA\">\n\
             \x20 <a style=\"left: 10px; top: 20px; width: 100px; height: 30px\" href=\"#sec1\"></a>\n\
             \x20 <a style=\"left: 0px; top: 140px;\" name=\"sec1\"></a>\n\
             </section>\n"
        );
    }
}
