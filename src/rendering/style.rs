//! Style resolution for the built-in renderer
//!
//! Rules come from three origins, applied in order: the user-agent sheet,
//! the document's own sheets, then the stylesheets passed by the caller.
//! Inside an origin rules are ordered by specificity, then source order.
//! The `style` attribute wins over everything.

use std::sync::OnceLock;

use scraper::ElementRef;
use url::Url;

use crate::boxes::{BoxStyle, Link, Rgba, BLACK};
use crate::stylesheet::{parse_declarations, Declaration, Stylesheet};

const USER_AGENT_CSS: &str = r#"
html, body, div, p, h1, h2, h3, h4, h5, h6, ul, ol, li, dl, dt, dd, blockquote,
pre, address, article, aside, footer, header, nav, section, main, figure,
figcaption, form, hr, table, tr, center, fieldset, details, summary { display: block }
head, script, style, title, meta, link, noscript, template, base { display: none }
body { margin: 8px }
p, ul, ol, dl, pre { margin: 1em 0 }
blockquote, figure { margin: 1em 40px }
ul, ol { padding-left: 40px }
dd { margin-left: 40px }
h1 { font-size: 2em; margin: 0.67em 0; font-weight: bold }
h2 { font-size: 1.5em; margin: 0.83em 0; font-weight: bold }
h3 { font-size: 1.17em; margin: 1em 0; font-weight: bold }
h4 { margin: 1.33em 0; font-weight: bold }
h5 { font-size: 0.83em; margin: 1.67em 0; font-weight: bold }
h6 { font-size: 0.67em; margin: 2.33em 0; font-weight: bold }
b, strong, th, dt { font-weight: bold }
small { font-size: smaller }
big { font-size: larger }
u, ins { text-decoration: underline }
a[href] { color: #0000ee; text-decoration: underline }
"#;

fn user_agent_sheet() -> &'static Stylesheet {
    static SHEET: OnceLock<Stylesheet> = OnceLock::new();
    SHEET.get_or_init(|| Stylesheet::parse(USER_AGENT_CSS))
}

/// Initial font size in px (`medium`)
pub const MEDIUM_FONT_SIZE: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    None,
}

/// Box edges in px
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub font_size: f32,
    pub bold: bool,
    pub color: Rgba,
    pub background: Option<Rgba>,
    pub underline: bool,
    pub margin: Edges,
    pub padding: Edges,
    pub link: Option<Link>,
    pub anchor: Option<String>,
}

impl ComputedStyle {
    /// Style of the (virtual) parent of the root element
    pub fn initial() -> Self {
        Self {
            display: Display::Inline,
            font_size: MEDIUM_FONT_SIZE,
            bold: false,
            color: BLACK,
            background: None,
            underline: false,
            margin: Edges::default(),
            padding: Edges::default(),
            link: None,
            anchor: None,
        }
    }

    /// Start a child style: inherited properties are copied, others reset.
    fn inherit(parent: &ComputedStyle) -> Self {
        Self {
            display: Display::Inline,
            background: None,
            margin: Edges::default(),
            padding: Edges::default(),
            anchor: None,
            ..parent.clone()
        }
    }

    pub fn box_style(&self) -> BoxStyle {
        BoxStyle {
            link: self.link.clone(),
            anchor: self.anchor.clone(),
            font_size: self.font_size,
            bold: self.bold,
            color: self.color,
            background: self.background,
            underline: self.underline,
        }
    }
}

struct MatchRule<'a> {
    origin: usize,
    specificity: u32,
    order: usize,
    selector: &'a scraper::Selector,
    declarations: &'a [Declaration],
}

/// Computes styles of elements of one document
pub struct StyleResolver<'a> {
    rules: Vec<MatchRule<'a>>,
    document_url: Option<Url>,
    base_url: Option<Url>,
}

impl<'a> StyleResolver<'a> {
    /// `author` holds the document's own sheets, `user` the sheets given to
    /// the renderer. `base_url` resolves relative links.
    pub fn new(author: &'a [Stylesheet], user: &'a [Stylesheet], document_url: &str, base_href: Option<&str>) -> Self {
        let mut rules = Vec::new();
        let origins = std::iter::once(std::slice::from_ref(user_agent_sheet()))
            .chain([author, user])
            .enumerate();
        for (origin, sheets) in origins {
            for sheet in sheets {
                for rule in sheet.rules() {
                    for sel in &rule.selectors {
                        rules.push(MatchRule {
                            origin,
                            specificity: sel.specificity,
                            order: rules.len(),
                            selector: &sel.selector,
                            declarations: &rule.declarations,
                        });
                    }
                }
            }
        }
        rules.sort_by_key(|r| (r.origin, r.specificity, r.order));

        let document_url = Url::parse(document_url).ok();
        let base_url = match (&document_url, base_href) {
            (Some(doc), Some(href)) => doc.join(href).ok().or_else(|| document_url.clone()),
            _ => document_url.clone(),
        };
        Self { rules, document_url, base_url }
    }

    /// Compute the style of `element` given its parent's style and the root
    /// font size (for `rem`).
    pub fn compute(&self, element: ElementRef<'_>, parent: &ComputedStyle, root_font_size: f32) -> ComputedStyle {
        let inline = element.value().attr("style").map(parse_declarations).unwrap_or_default();
        let declarations: Vec<&Declaration> = self
            .rules
            .iter()
            .filter(|r| r.selector.matches(&element))
            .flat_map(|r| r.declarations.iter())
            .chain(inline.iter())
            .collect();

        let mut style = ComputedStyle::inherit(parent);

        // font-size first: em lengths below depend on it
        if let Some(decl) = declarations.iter().rev().find(|d| d.name == "font-size") {
            if let Some(size) = parse_font_size(&decl.value, parent.font_size, root_font_size) {
                style.font_size = size;
            }
        }
        for decl in &declarations {
            apply(&mut style, decl, root_font_size);
        }

        let el = element.value();
        if el.name() == "a" {
            if let Some(link) = el.attr("href").and_then(|href| self.resolve_link(href)) {
                style.link = Some(link);
            }
        }
        style.anchor = el
            .attr("id")
            .or_else(|| if el.name() == "a" { el.attr("name") } else { None })
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        style
    }

    /// Resolve an `href`: fragments of the document itself are internal,
    /// anything else is an absolute external URL.
    pub fn resolve_link(&self, href: &str) -> Option<Link> {
        let href = href.trim();
        if let Some(fragment) = href.strip_prefix('#') {
            return Some(Link::internal(fragment));
        }
        let Some(base) = &self.base_url else {
            return Some(Link::external(href));
        };
        let target = base.join(href).ok()?;
        if let (Some(fragment), Some(doc)) = (target.fragment(), &self.document_url) {
            let mut without = target.clone();
            without.set_fragment(None);
            let mut doc = doc.clone();
            doc.set_fragment(None);
            if without == doc {
                return Some(Link::internal(fragment));
            }
        }
        Some(Link::external(target.to_string()))
    }
}

fn apply(style: &mut ComputedStyle, decl: &Declaration, rem: f32) {
    let em = style.font_size;
    let value = decl.value.trim();
    match decl.name.as_str() {
        "display" => {
            style.display = match value {
                "none" => Display::None,
                "inline" | "inline-block" | "inline-flex" | "table-cell" | "contents" => Display::Inline,
                _ => Display::Block,
            }
        }
        "font-weight" => {
            style.bold = match value {
                "bold" | "bolder" => true,
                "normal" | "lighter" => false,
                n => n.parse::<u32>().map(|w| w >= 600).unwrap_or(style.bold),
            }
        }
        "color" => {
            if let Some(c) = parse_color(value) {
                style.color = c;
            }
        }
        "background-color" => style.background = parse_color(value).filter(|c| c.3 > 0),
        "background" => {
            style.background = value.split_whitespace().find_map(parse_color).filter(|c| c.3 > 0);
        }
        "text-decoration" | "text-decoration-line" => {
            if value.contains("underline") {
                style.underline = true;
            } else if value == "none" {
                style.underline = false;
            }
        }
        "margin" => {
            if let Some(e) = parse_edges(value, em, rem) {
                style.margin = e;
            }
        }
        "padding" => {
            if let Some(e) = parse_edges(value, em, rem) {
                style.padding = e;
            }
        }
        name => {
            let (edges, side) = if let Some(side) = name.strip_prefix("margin-") {
                (&mut style.margin, side)
            } else if let Some(side) = name.strip_prefix("padding-") {
                (&mut style.padding, side)
            } else {
                return;
            };
            let Some(v) = parse_length(value, em, rem) else { return };
            match side {
                "top" => edges.top = v,
                "right" => edges.right = v,
                "bottom" => edges.bottom = v,
                "left" => edges.left = v,
                _ => {}
            }
        }
    }
}

/// Parse a length in px. `auto` and percentages resolve to 0.
pub fn parse_length(value: &str, em: f32, rem: f32) -> Option<f32> {
    let value = value.trim();
    if value == "auto" || value.ends_with('%') {
        return Some(0.0);
    }
    let number = |suffix: &str| value.strip_suffix(suffix).and_then(|n| n.trim().parse::<f32>().ok());
    if let Some(n) = number("rem") {
        return Some(n * rem);
    }
    if let Some(n) = number("em") {
        return Some(n * em);
    }
    if let Some(n) = number("px") {
        return Some(n);
    }
    if let Some(n) = number("pt") {
        return Some(n * 4.0 / 3.0);
    }
    if let Some(n) = number("pc") {
        return Some(n * 16.0);
    }
    if let Some(n) = number("in") {
        return Some(n * 96.0);
    }
    if let Some(n) = number("cm") {
        return Some(n * 96.0 / 2.54);
    }
    if let Some(n) = number("mm") {
        return Some(n * 96.0 / 25.4);
    }
    match value.parse::<f32>() {
        Ok(n) if n == 0.0 => Some(0.0),
        _ => None,
    }
}

/// `margin`/`padding` shorthand with one to four values.
fn parse_edges(value: &str, em: f32, rem: f32) -> Option<Edges> {
    let parts = value
        .split_whitespace()
        .map(|v| parse_length(v, em, rem))
        .collect::<Option<Vec<_>>>()?;
    let (top, right, bottom, left) = match parts.as_slice() {
        [a] => (*a, *a, *a, *a),
        [v, h] => (*v, *h, *v, *h),
        [t, h, b] => (*t, *h, *b, *h),
        [t, r, b, l] => (*t, *r, *b, *l),
        _ => return None,
    };
    Some(Edges { top, right, bottom, left })
}

fn parse_font_size(value: &str, parent: f32, rem: f32) -> Option<f32> {
    let value = value.trim();
    let keyword = match value {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(MEDIUM_FONT_SIZE),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "smaller" => Some(parent / 1.2),
        "larger" => Some(parent * 1.2),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }
    if let Some(pct) = value.strip_suffix('%').and_then(|n| n.trim().parse::<f32>().ok()) {
        return Some(parent * pct / 100.0);
    }
    parse_length(value, parent, rem).filter(|s| *s > 0.0)
}

/// Parse a CSS color: a few keywords, `#rgb`, `#rrggbb`, `rgb()` and `rgba()`.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim().to_ascii_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        let digit = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
        return match hex.len() {
            3 => Some((digit(0, 1)? * 17, digit(1, 1)? * 17, digit(2, 1)? * 17, 255)),
            6 => Some((digit(0, 2)?, digit(2, 2)?, digit(4, 2)?, 255)),
            _ => None,
        };
    }
    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|v| v.strip_suffix(')'))
    {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let channel = |s: &str| s.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0) as u8);
        let alpha = match parts.get(3) {
            Some(a) => (a.parse::<f32>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
            None => 255,
        };
        return Some((channel(parts.first()?)?, channel(parts.get(1)?)?, channel(parts.get(2)?)?, alpha));
    }
    let named = match value.as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "navy" => (0, 0, 128),
        "purple" => (128, 0, 128),
        "maroon" => (128, 0, 0),
        "teal" => (0, 128, 128),
        "olive" => (128, 128, 0),
        "orange" => (255, 165, 0),
        "yellow" => (255, 255, 0),
        "silver" => (192, 192, 192),
        "gray" | "grey" => (128, 128, 128),
        "transparent" => return Some((0, 0, 0, 0)),
        _ => return None,
    };
    Some((named.0, named.1, named.2, 255))
}
