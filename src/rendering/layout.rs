/// Block and inline layout with pagination
///
/// The document is flowed once, word by word, onto fixed-size pages. Every
/// placed word remembers the chain of boxes it sits in (blocks, its line,
/// inline elements). Page box trees are rebuilt from those chains, so an
/// element that spans several lines or pages yields one box per fragment.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Node};

use super::font::{line_height, text_width, to_ascii};
use super::style::{ComputedStyle, Display, Edges, StyleResolver, MEDIUM_FONT_SIZE};
use crate::boxes::{BoxNode, BoxStyle, Rect};
use crate::PageSize;

/// Page geometry used by the layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub page: PageSize,
    /// Margin on all four sides, in px
    pub margin: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Element(usize),
    Line(usize),
}

#[derive(Debug, Clone)]
struct ElementInfo {
    style: BoxStyle,
    /// Horizontal border-box extent, for blocks
    block: Option<(f32, f32)>,
}

/// A word waiting for its line to be finished
#[derive(Debug, Clone)]
struct Pending {
    text: String,
    space_before: bool,
    x: f32,
    width: f32,
    font_size: f32,
    bold: bool,
    owner: usize,
    path: Vec<Step>,
    marker: bool,
}

/// A word placed on a page, or a zero-width marker standing in for an
/// element that placed no words
#[derive(Debug, Clone)]
struct Word {
    text: String,
    space_before: bool,
    rect: Rect,
    page: usize,
    owner: usize,
    path: Vec<Step>,
    marker: bool,
}

struct Flow<'r, 'a> {
    resolver: &'r StyleResolver<'a>,
    options: LayoutOptions,
    root_font_size: f32,
    elements: Vec<ElementInfo>,
    words: Vec<Word>,
    path: Vec<Step>,
    /// Length of `path` up to and including the innermost block
    block_depth: usize,
    left: f32,
    right: f32,
    line: Vec<Pending>,
    line_x: f32,
    pending_space: bool,
    lines: usize,
    page: usize,
    y: f32,
}

/// Lay `document` out and return one box tree per page.
///
/// An empty document still produces one (empty) page.
pub fn layout_document(document: &Html, resolver: &StyleResolver<'_>, options: LayoutOptions) -> Vec<BoxNode> {
    let mut flow = Flow {
        resolver,
        options,
        root_font_size: MEDIUM_FONT_SIZE,
        elements: Vec::new(),
        words: Vec::new(),
        path: Vec::new(),
        block_depth: 0,
        left: options.margin,
        right: options.page.width as f32 - options.margin,
        line: Vec::new(),
        line_x: options.margin,
        pending_space: false,
        lines: 0,
        page: 0,
        y: options.margin,
    };

    let root = document.root_element();
    let root_style = resolver.compute(root, &ComputedStyle::initial(), MEDIUM_FONT_SIZE);
    flow.root_font_size = root_style.font_size;
    flow.element(root, root_style);
    flow.flush_line();
    log::trace!("Laid out {} words on {} page(s)", flow.words.len(), flow.page + 1);
    flow.into_pages()
}

impl<'r, 'a> Flow<'r, 'a> {
    fn content_top(&self) -> f32 {
        self.options.margin
    }

    fn content_bottom(&self) -> f32 {
        self.options.page.height as f32 - self.options.margin
    }

    fn children(&mut self, element: ElementRef<'_>, style: &ComputedStyle, owner: usize) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(text, style, owner),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        let child_style = self.resolver.compute(el, style, self.root_font_size);
                        self.element(el, child_style);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>, style: ComputedStyle) {
        match style.display {
            Display::None => {}
            Display::Block => self.block(element, style),
            Display::Inline => self.inline(element, style),
        }
    }

    fn block(&mut self, element: ElementRef<'_>, style: ComputedStyle) {
        self.flush_line();
        self.pending_space = false;
        let Edges { top, right, bottom, left } = style.margin;
        let padding = style.padding;
        let (outer_left, outer_right) = (self.left, self.right);

        self.y += top;
        let block_top = self.y;
        let placed = self.placed();
        let x = outer_left + left;
        let width = (outer_right - right - x).max(0.0);
        let id = self.elements.len();
        self.elements.push(ElementInfo { style: style.box_style(), block: Some((x, width)) });

        let saved_depth = self.block_depth;
        self.path.push(Step::Element(id));
        self.block_depth = self.path.len();
        self.y += padding.top;
        self.left = x + padding.left;
        self.right = (x + width - padding.right).max(self.left + 1.0);

        self.children(element, &style, id);
        self.flush_line();
        self.pending_space = false;

        self.y += padding.bottom;
        if self.placed() == placed {
            self.words.push(Word {
                text: String::new(),
                space_before: false,
                rect: Rect::new(x, block_top, width, self.y - block_top),
                page: self.page,
                owner: id,
                path: self.path.clone(),
                marker: true,
            });
        }
        self.left = outer_left;
        self.right = outer_right;
        self.block_depth = saved_depth;
        self.path.pop();
        self.y += bottom;
    }

    fn inline(&mut self, element: ElementRef<'_>, style: ComputedStyle) {
        if element.value().name() == "br" {
            if !self.line_has_words() {
                self.y += line_height(style.font_size, style.bold);
            }
            self.flush_line();
            self.pending_space = false;
            return;
        }
        let id = self.elements.len();
        self.elements.push(ElementInfo { style: style.box_style(), block: None });
        self.path.push(Step::Element(id));
        let placed = self.placed();
        self.children(element, &style, id);
        if self.placed() == placed {
            if self.line.is_empty() {
                self.line_x = self.left;
            }
            self.line.push(Pending {
                text: String::new(),
                space_before: false,
                x: self.line_x,
                width: 0.0,
                font_size: style.font_size,
                bold: style.bold,
                owner: id,
                path: self.path.clone(),
                marker: true,
            });
        }
        self.path.pop();
    }

    /// Words and markers placed so far, pending or not.
    fn placed(&self) -> usize {
        self.words.len() + self.line.len()
    }

    fn line_has_words(&self) -> bool {
        self.line.iter().any(|p| !p.marker)
    }

    fn text(&mut self, text: &str, style: &ComputedStyle, owner: usize) {
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                self.pending_space = true;
            }
            self.word(word, style, owner);
        }
        if text.ends_with(char::is_whitespace) {
            self.pending_space = true;
        }
    }

    fn word(&mut self, word: &str, style: &ComputedStyle, owner: usize) {
        let text = to_ascii(word).into_owned();
        let width = text_width(&text, style.font_size, style.bold);
        let mut space_before = self.pending_space && self.line_has_words();
        let mut space = if space_before { text_width(" ", style.font_size, style.bold) } else { 0.0 };

        if self.line_has_words() && self.line_x + space + width > self.right {
            self.flush_line();
            space_before = false;
            space = 0.0;
        }
        if self.line.is_empty() {
            self.line_x = self.left;
        }
        let x = self.line_x + space;
        self.line.push(Pending {
            text,
            space_before,
            x,
            width,
            font_size: style.font_size,
            bold: style.bold,
            owner,
            path: self.path.clone(),
            marker: false,
        });
        self.line_x = x + width;
        self.pending_space = false;
    }

    fn flush_line(&mut self) {
        if self.line.is_empty() {
            return;
        }
        let height = self
            .line
            .iter()
            .filter(|w| !w.marker)
            .map(|w| line_height(w.font_size, w.bold))
            .fold(0.0, f32::max);
        if self.y + height > self.content_bottom() && self.y > self.content_top() + 0.5 {
            self.page += 1;
            self.y = self.content_top();
        }

        let line_id = self.lines;
        self.lines += 1;
        for pending in self.line.drain(..) {
            let rect = if pending.marker {
                Rect::new(pending.x, self.y, 0.0, height)
            } else {
                let own = line_height(pending.font_size, pending.bold);
                Rect::new(pending.x, self.y + height - own, pending.width, own)
            };
            let mut path = pending.path;
            path.insert(self.block_depth.min(path.len()), Step::Line(line_id));
            self.words.push(Word {
                text: pending.text,
                space_before: pending.space_before,
                rect,
                page: self.page,
                owner: pending.owner,
                path,
                marker: pending.marker,
            });
        }
        self.y += height;
    }

    fn into_pages(self) -> Vec<BoxNode> {
        let page_size = self.options.page;
        let page_count = self.words.last().map_or(1, |w| w.page + 1).max(self.page + 1);
        let mut seen = HashSet::new();
        let mut start = 0;
        (0..page_count)
            .map(|page| {
                let end = start + self.words[start..].iter().take_while(|w| w.page == page).count();
                let children = self.build(&self.words[start..end], 0, &mut seen);
                start = end;
                BoxNode::container(
                    BoxStyle::default(),
                    Rect::new(0.0, 0.0, page_size.width as f32, page_size.height as f32),
                    children,
                )
            })
            .collect()
    }

    /// Boxes for `words`, which all share `path[..depth]`.
    fn build(&self, words: &[Word], depth: usize, seen: &mut HashSet<usize>) -> Vec<BoxNode> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < words.len() {
            let step = words[i].path.get(depth).copied();
            let run = words[i..]
                .iter()
                .take_while(|w| w.path.get(depth).copied() == step)
                .count();
            let group = &words[i..i + run];
            i += run;

            let node = match step {
                None => match self.text_leaf(group) {
                    Some(leaf) => leaf,
                    None => continue,
                },
                Some(Step::Line(_)) => {
                    let children = self.build(group, depth + 1, seen);
                    let parent = match depth.checked_sub(1).and_then(|d| group[0].path.get(d)) {
                        Some(Step::Element(id)) => self.elements[*id].style.anonymous(),
                        _ => BoxStyle::default(),
                    };
                    BoxNode::container(parent, covering(&children), children)
                }
                Some(Step::Element(id)) => {
                    let children = self.build(group, depth + 1, seen);
                    let info = &self.elements[id];
                    let mut style = info.style.clone();
                    // anchors belong to the first fragment only
                    if !seen.insert(id) {
                        style.anchor = None;
                    }
                    // an element that placed no words is sized by its marker
                    let markers = group
                        .iter()
                        .filter(|w| w.marker && w.path.len() == depth + 1)
                        .map(|w| w.rect);
                    let mut area = markers
                        .chain(children.iter().map(BoxNode::area))
                        .reduce(|acc, r| acc.union(&r))
                        .unwrap_or_default();
                    if let Some((x, width)) = info.block {
                        area.x = x;
                        area.width = width;
                    }
                    BoxNode::container(style, area, children)
                }
            };
            out.push(node);
        }
        out
    }

    /// Leaf for a run of words; markers alone produce none.
    fn text_leaf(&self, words: &[Word]) -> Option<BoxNode> {
        let mut words = words.iter().filter(|w| !w.marker);
        let first = words.next()?;
        let mut text = first.text.clone();
        let mut area = first.rect;
        for w in words {
            if w.space_before {
                text.push(' ');
            }
            text.push_str(&w.text);
            area = area.union(&w.rect);
        }
        let mut style = self.elements[first.owner].style.clone();
        style.anchor = None;
        style.background = None;
        Some(BoxNode::leaf(style, area, text))
    }
}

fn covering(children: &[BoxNode]) -> Rect {
    let mut areas = children.iter().map(BoxNode::area);
    match areas.next() {
        Some(first) => areas.fold(first, |acc, r| acc.union(&r)),
        None => Rect::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;
    use crate::Stylesheet;

    fn options() -> LayoutOptions {
        LayoutOptions { page: PageSize { width: 400, height: 300 }, margin: 20.0 }
    }

    fn layout(html: &str) -> Vec<BoxNode> {
        let doc = Html::parse_document(html);
        let user = [Stylesheet::print()];
        let resolver = StyleResolver::new(&[], &user, "http://a.example/", None);
        layout_document(&doc, &resolver, options())
    }

    fn leaves(node: &BoxNode, out: &mut Vec<String>) {
        match node {
            BoxNode::Leaf(l) => out.push(l.text.clone()),
            BoxNode::Container(c) => c.children.iter().for_each(|c| leaves(c, out)),
        }
    }

    #[test]
    fn layout_document_places_blocks_in_order() {
        let pages = layout("<html><head><title>T</title></head><body><h1>Heading</h1><p>Hello world</p></body></html>");
        assert_eq!(pages.len(), 1);
        let mut text = Vec::new();
        leaves(&pages[0], &mut text);
        assert_eq!(text, ["Heading", "Hello world"]);
        assert_eq!(pages[0].area(), Rect::new(0.0, 0.0, 400.0, 300.0));
    }

    #[test]
    fn empty_document_has_one_empty_page() {
        let pages = layout("");
        assert_eq!(pages.len(), 1);
        let mut text = Vec::new();
        leaves(&pages[0], &mut text);
        assert!(text.is_empty());
        assert_eq!(geometry::extract(&pages[0]), geometry::PageGeometry::default());
    }

    #[test]
    fn elements_without_text_keep_their_anchors() {
        let pages = layout(
            "<p><a href='#top'>up</a></p><a name='top'></a><div id='empty' style='padding: 5px'></div><p>text</p>",
        );
        assert_eq!(pages.len(), 1);
        let g = geometry::extract(&pages[0]);
        assert_eq!(g.links.iter().map(|l| l.href.as_str()).collect::<Vec<_>>(), ["#top"]);
        let names: Vec<_> = g.anchors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["top", "empty"]);

        let top = &g.anchors[0];
        let empty = &g.anchors[1];
        assert_eq!(top.width, 0.0);
        assert!(top.y > g.links[0].y);
        assert_eq!(empty.height, 10.0);
        assert!(empty.y >= top.y);

        // the marker takes no room: the following paragraph starts right
        // below the empty div
        let mut text = Vec::new();
        leaves(&pages[0], &mut text);
        assert_eq!(text, ["up", "text"]);
    }

    #[test]
    fn empty_inline_anchor_before_text_shares_its_line() {
        let pages = layout("<h2><a name='intro'></a>Intro</h2>");
        let g = geometry::extract(&pages[0]);
        assert_eq!(g.anchors.len(), 1);
        assert_eq!(g.anchors[0].name, "intro");
        assert_eq!(g.anchors[0].x, 28.0);
        let mut text = Vec::new();
        leaves(&pages[0], &mut text);
        assert_eq!(text, ["Intro"]);
    }

    #[test]
    fn link_container_gets_one_record() {
        let pages = layout("<p>go <a href='#end'>to the end</a> now</p><p id=end>end</p>");
        let g = geometry::extract(&pages[0]);
        assert_eq!(g.links.len(), 1);
        assert_eq!(g.links[0].href, "#end");
        // 10pt root font: 7px per character
        assert_eq!(g.links[0].width, text_width("to the end", 40.0 / 3.0, false));
        assert_eq!(g.anchors.len(), 1);
        assert_eq!(g.anchors[0].name, "end");
    }

    #[test]
    fn long_text_wraps_and_splits_inline_boxes() {
        let words = "word ".repeat(30);
        let pages = layout(&format!("<p><a href='http://b.example/'>{}</a></p>", words));
        let g = geometry::extract(&pages[0]);
        // one link region per line fragment
        assert!(g.links.len() > 1);
        assert!(g.links.iter().all(|l| l.href == "/view/http://b.example/"));
        assert!(g.links.iter().all(|l| l.x + l.width <= 380.0 + 0.01));
    }

    #[test]
    fn overflowing_content_moves_to_new_pages() {
        let body: String = (0..40).map(|i| format!("<p id=p{}>paragraph {}</p>", i, i)).collect();
        let pages = layout(&body);
        assert!(pages.len() > 1);
        let anchors: Vec<_> = pages.iter().flat_map(|p| geometry::extract(p).anchors).collect();
        assert_eq!(anchors.len(), 40);
        for page in &pages {
            for a in geometry::extract(page).anchors {
                assert!(a.y >= 20.0 && a.y + a.height <= 280.0 + 0.01);
            }
        }
    }

    #[test]
    fn split_block_keeps_anchor_on_first_fragment() {
        let body = format!("<div id=long>{}</div>", "line<br>".repeat(40));
        let pages = layout(&body);
        assert!(pages.len() > 1);
        let total: usize = pages.iter().map(|p| geometry::extract(p).anchors.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn hidden_elements_produce_no_boxes() {
        let pages = layout("<p style='display:none' id=gone>x</p><script>var a;</script><p>y</p>");
        let mut text = Vec::new();
        leaves(&pages[0], &mut text);
        assert_eq!(text, ["y"]);
        assert!(geometry::extract(&pages[0]).anchors.is_empty());
    }
}
