//! Rendered box tree
//!
//! A page is represented by a tree of [`BoxNode`]s produced by a renderer
//! after layout. Nodes are either text-bearing leaves or containers that own
//! their children in document order. Styles are already resolved when the
//! tree is handed out: the inherited `link` value sits on every
//! element-generated node, while `anchor` is only set on the node that
//! declared it.

/// RGBA color, 8 bits per channel
pub type Rgba = (u8, u8, u8, u8);

pub const BLACK: Rgba = (0, 0, 0, 255);

/// Axis-aligned rectangle in page pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// Where a link points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A fragment of the current document
    Internal,
    /// Any other document
    External,
}

/// A resolved hyperlink. For internal links `target` is the fragment name
/// (without `#`); for external links it is an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub kind: LinkKind,
    pub target: String,
}

impl Link {
    pub fn internal(fragment: impl Into<String>) -> Self {
        Self { kind: LinkKind::Internal, target: fragment.into() }
    }

    pub fn external(url: impl Into<String>) -> Self {
        Self { kind: LinkKind::External, target: url.into() }
    }
}

/// Resolved style of a box
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStyle {
    pub link: Option<Link>,
    pub anchor: Option<String>,
    /// Font size in px
    pub font_size: f32,
    pub bold: bool,
    pub color: Rgba,
    pub background: Option<Rgba>,
    pub underline: bool,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            link: None,
            anchor: None,
            font_size: 16.0,
            bold: false,
            color: BLACK,
            background: None,
            underline: false,
        }
    }
}

impl BoxStyle {
    /// Style of an anonymous box: paint properties are kept, `link` and
    /// `anchor` are cleared.
    pub fn anonymous(&self) -> Self {
        Self { link: None, anchor: None, background: None, ..self.clone() }
    }
}

/// A run of text laid out on a single line
#[derive(Debug, Clone, PartialEq)]
pub struct LeafBox {
    pub style: BoxStyle,
    pub area: Rect,
    pub text: String,
}

/// A box with children: pages, blocks, lines and inline elements
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerBox {
    pub style: BoxStyle,
    pub area: Rect,
    pub children: Vec<BoxNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxNode {
    Leaf(LeafBox),
    Container(ContainerBox),
}

impl BoxNode {
    pub fn leaf(style: BoxStyle, area: Rect, text: impl Into<String>) -> Self {
        BoxNode::Leaf(LeafBox { style, area, text: text.into() })
    }

    pub fn container(style: BoxStyle, area: Rect, children: Vec<BoxNode>) -> Self {
        BoxNode::Container(ContainerBox { style, area, children })
    }

    pub fn style(&self) -> &BoxStyle {
        match self {
            BoxNode::Leaf(b) => &b.style,
            BoxNode::Container(b) => &b.style,
        }
    }

    pub fn area(&self) -> Rect {
        match self {
            BoxNode::Leaf(b) => b.area,
            BoxNode::Container(b) => b.area,
        }
    }

    /// Border area of the box as `(x, y, width, height)`; this is the area
    /// hit-testing is done on.
    pub fn hit_area(&self) -> (f32, f32, f32, f32) {
        let r = self.area();
        (r.x, r.y, r.width, r.height)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BoxNode::Leaf(_))
    }

    pub fn children(&self) -> &[BoxNode] {
        match self {
            BoxNode::Leaf(_) => &[],
            BoxNode::Container(b) => &b.children,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(BoxNode::count).sum::<usize>()
    }
}
