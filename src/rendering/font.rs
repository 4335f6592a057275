/// Monospace bitmap fonts used for both text measurement and rasterization
use embedded_graphics::mono_font::ascii::{
    FONT_10X20, FONT_6X10, FONT_6X13_BOLD, FONT_7X13, FONT_7X13_BOLD, FONT_8X13, FONT_8X13_BOLD, FONT_9X15,
    FONT_9X15_BOLD, FONT_9X18, FONT_9X18_BOLD,
};
use embedded_graphics::mono_font::MonoFont;
use std::borrow::Cow;

/// Pick the bitmap font closest to a CSS font size in px.
pub fn font_for(size_px: f32, bold: bool) -> &'static MonoFont<'static> {
    match (size_px, bold) {
        (s, false) if s < 11.5 => &FONT_6X10,
        (s, true) if s < 11.5 => &FONT_6X13_BOLD,
        (s, false) if s < 14.5 => &FONT_7X13,
        (s, true) if s < 14.5 => &FONT_7X13_BOLD,
        (s, false) if s < 16.5 => &FONT_8X13,
        (s, true) if s < 16.5 => &FONT_8X13_BOLD,
        (s, false) if s < 19.5 => &FONT_9X15,
        (s, true) if s < 19.5 => &FONT_9X15_BOLD,
        (s, false) if s < 23.5 => &FONT_9X18,
        (s, true) if s < 23.5 => &FONT_9X18_BOLD,
        _ => &FONT_10X20,
    }
}

/// Advance of one character
pub fn char_advance(font: &MonoFont<'_>) -> f32 {
    (font.character_size.width + font.character_spacing) as f32
}

/// Width of `text` in px
pub fn text_width(text: &str, size_px: f32, bold: bool) -> f32 {
    let font = font_for(size_px, bold);
    text.chars().count() as f32 * char_advance(font)
}

/// Line height for a font size: the larger of 1.2em and the glyph height.
pub fn line_height(size_px: f32, bold: bool) -> f32 {
    let glyph = font_for(size_px, bold).character_size.height as f32;
    (size_px * 1.2).ceil().max(glyph)
}

/// Replace typographic characters the ASCII fonts lack with close ASCII.
pub fn to_ascii(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{00A0}' => out.push(' '),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            other if other.is_ascii() => out.push(other),
            _ => out.push('?'),
        }
    }
    Cow::Owned(out)
}
