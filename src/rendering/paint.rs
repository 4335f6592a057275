/// Paint commands produced from a page box tree
use crate::boxes::{BoxNode, Rgba};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        font_size: f32,
        bold: bool,
        rgba: Rgba,
    },
}

/// Display list for one page, back to front.
pub fn display_list(root: &BoxNode) -> Vec<PaintCommand> {
    let mut commands = Vec::new();
    paint_box(root, &mut commands);
    commands
}

fn paint_box(node: &BoxNode, out: &mut Vec<PaintCommand>) {
    let style = node.style();
    let area = node.area();
    match node {
        BoxNode::Container(c) => {
            if let Some(rgba) = style.background {
                out.push(PaintCommand::SolidRect {
                    x: area.x.round() as i32,
                    y: area.y.round() as i32,
                    width: area.width.round().max(0.0) as u32,
                    height: area.height.round().max(0.0) as u32,
                    rgba,
                });
            }
            for child in &c.children {
                paint_box(child, out);
            }
        }
        BoxNode::Leaf(leaf) => {
            out.push(PaintCommand::Text {
                x: area.x.round() as i32,
                y: area.y.round() as i32,
                text: leaf.text.clone(),
                font_size: style.font_size,
                bold: style.bold,
                rgba: style.color,
            });
            if style.underline {
                out.push(PaintCommand::SolidRect {
                    x: area.x.round() as i32,
                    y: (area.bottom() - 2.0).round() as i32,
                    width: area.width.round().max(0.0) as u32,
                    height: 1,
                    rgba: style.color,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::{BoxStyle, Rect};

    #[test]
    fn backgrounds_come_before_text() {
        let text_style = BoxStyle { underline: true, color: (0, 0, 238, 255), ..Default::default() };
        let leaf = BoxNode::leaf(text_style, Rect::new(10.0, 20.0, 30.0, 16.0), "link");
        let bg = BoxStyle { background: Some((255, 255, 0, 255)), ..Default::default() };
        let root = BoxNode::container(bg, Rect::new(0.0, 0.0, 100.0, 50.0), vec![leaf]);

        let cmds = display_list(&root);
        assert_eq!(cmds.len(), 3);
        match &cmds[0] {
            PaintCommand::SolidRect { width, rgba, .. } => {
                assert_eq!(*width, 100);
                assert_eq!(*rgba, (255, 255, 0, 255));
            }
            _ => panic!("unexpected"),
        }
        match &cmds[1] {
            PaintCommand::Text { text, x, y, .. } => assert_eq!((text.as_str(), *x, *y), ("link", 10, 20)),
            _ => panic!("unexpected"),
        }
        match &cmds[2] {
            PaintCommand::SolidRect { y, height, .. } => assert_eq!((*y, *height), (34, 1)),
            _ => panic!("unexpected"),
        }
    }
}
