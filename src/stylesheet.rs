//! CSS stylesheets
//!
//! A deliberately small CSS reader: rule sets are split into selectors and
//! declarations, selectors are compiled with `scraper` so they can be matched
//! against parsed documents. At-rules and comments are skipped.

use scraper::Selector;

/// Source of the stylesheet applied to every render, both page images and
/// PDF export.
pub const PRINT_STYLESHEET: &str = ":root { font-size: 10pt }";

/// A single `name: value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

/// A compiled selector with its specificity
#[derive(Debug, Clone)]
pub struct StyleSelector {
    pub text: String,
    pub selector: Selector,
    pub specificity: u32,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub selectors: Vec<StyleSelector>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub struct Stylesheet {
    source: String,
    rules: Vec<Rule>,
}

impl PartialEq for Stylesheet {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Stylesheet {
    pub fn parse(source: &str) -> Self {
        let rules = parse_rules(&strip_comments(source));
        Self { source: source.to_string(), rules }
    }

    /// The fixed stylesheet shared by page rendering and PDF export.
    pub fn print() -> Self {
        Self::parse(PRINT_STYLESHEET)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Parse the body of a `style=""` attribute or a rule block.
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    block
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value.strip_suffix("!important").unwrap_or(value).trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some(Declaration { name, value: value.to_string() })
        })
        .collect()
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Bounds of the block opened at `open`: the offset of its closing `}` and
/// the offset just past it. An unclosed block runs to the end of `source`.
fn block_end(source: &str, open: usize) -> (usize, usize) {
    let mut depth = 0usize;
    for (i, c) in source[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return (open + i, open + i + 1);
                }
            }
            _ => {}
        }
    }
    (source.len(), source.len())
}

fn parse_rules(source: &str) -> Vec<Rule> {
    let mut rules = Vec::new();
    let mut pos = 0;
    while pos < source.len() {
        let rest = &source[pos..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        pos += rest.len() - trimmed.len();

        let Some(open) = source[pos..].find('{').map(|i| pos + i) else {
            break;
        };
        let prelude = source[pos..open].trim();

        // `@import url(..);` and friends end at a semicolon before any block
        if prelude.starts_with('@') {
            if let Some(semi) = prelude.find(';') {
                pos += semi + 1;
                continue;
            }
            pos = block_end(source, open).1;
            continue;
        }

        let (close, end) = block_end(source, open);
        let body = &source[open + 1..close];
        pos = end;

        let selectors: Vec<StyleSelector> = prelude.split(',').filter_map(compile_selector).collect();
        if selectors.is_empty() {
            continue;
        }
        rules.push(Rule { selectors, declarations: parse_declarations(body) });
    }
    rules
}

fn compile_selector(text: &str) -> Option<StyleSelector> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match Selector::parse(text) {
        Ok(selector) => Some(StyleSelector {
            text: text.to_string(),
            selector,
            specificity: specificity(text),
        }),
        Err(e) => {
            log::warn!("Ignoring unsupported selector {:?}: {:?}", text, e);
            None
        }
    }
}

/// Approximate specificity packed as `ids * 10000 + classes * 100 + types`.
fn specificity(text: &str) -> u32 {
    let (mut ids, mut classes, mut types) = (0u32, 0u32, 0u32);
    let mut chars = text.chars().peekable();
    let mut at_compound_start = true;
    while let Some(c) = chars.next() {
        match c {
            '#' => ids += 1,
            '.' => classes += 1,
            '[' => {
                classes += 1;
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                }
            }
            ':' => {
                if chars.peek() == Some(&':') {
                    chars.next();
                    types += 1;
                } else {
                    classes += 1;
                }
            }
            ' ' | '>' | '+' | '~' => {
                at_compound_start = true;
                continue;
            }
            c if at_compound_start && c.is_ascii_alphabetic() => types += 1,
            _ => {}
        }
        at_compound_start = false;
    }
    ids * 10000 + classes * 100 + types
}
