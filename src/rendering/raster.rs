/// Rasterizer: paints a display list onto an RGBA canvas and encodes PNG
use std::convert::Infallible;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgba as RgbaPixel, RgbaImage};

use super::font::font_for;
use super::paint::PaintCommand;
use crate::boxes::Rgba;
use crate::{Error, PageRaster, Result};

const WHITE: RgbaPixel<u8> = RgbaPixel([255, 255, 255, 255]);

/// Drawing surface backed by an `RgbaImage`
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { image: RgbaImage::from_pixel(width, height, WHITE) }
    }

    /// Fill a rectangle, blending with the current pixels by alpha.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, rgba: Rgba) {
        let (w, h) = self.image.dimensions();
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x.saturating_add(width as i32)).clamp(0, w as i32) as u32;
        let y1 = (y.saturating_add(height as i32)).clamp(0, h as i32) as u32;
        let alpha = rgba.3 as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                let dst = self.image.get_pixel_mut(px, py);
                let blend = |src: u8, dst: u8| ((src as u32 * alpha + dst as u32 * (255 - alpha)) / 255) as u8;
                *dst = RgbaPixel([blend(rgba.0, dst[0]), blend(rgba.1, dst[1]), blend(rgba.2, dst[2]), 255]);
            }
        }
    }

    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, font_size: f32, bold: bool, rgba: Rgba) {
        let style = MonoTextStyle::new(font_for(font_size, bold), Rgb888::new(rgba.0, rgba.1, rgba.2));
        if let Err(e) = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(self) {
            match e {}
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        let (w, h) = self.image.dimensions();
        Size::new(w, h)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        let (w, h) = self.image.dimensions();
        for embedded_graphics::Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= w as i32 || point.y >= h as i32 {
                continue;
            }
            self.image
                .put_pixel(point.x as u32, point.y as u32, RgbaPixel([color.r(), color.g(), color.b(), 255]));
        }
        Ok(())
    }
}

/// Paint `commands` on a white `width`×`height` page and encode it as PNG.
pub fn rasterize(width: u32, height: u32, commands: &[PaintCommand]) -> Result<PageRaster> {
    let mut canvas = Canvas::new(width, height);
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => canvas.fill_rect(*x, *y, *width, *height, *rgba),
            PaintCommand::Text { x, y, text, font_size, bold, rgba } => {
                canvas.draw_text(*x, *y, text, *font_size, *bold, *rgba)
            }
        }
    }
    Ok(PageRaster { width, height, png_data: encode_png(&canvas.into_image())? })
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(image.as_raw(), image.width(), image.height(), image::ExtendedColorType::Rgba8)
        .map_err(|e| Error::RenderError(format!("PNG encoding failed: {}", e)))?;
    Ok(buf)
}

/// 16×16 site icon
pub fn favicon() -> Result<Vec<u8>> {
    let mut canvas = Canvas::new(16, 16);
    canvas.fill_rect(0, 0, 16, 16, (0x22, 0x44, 0x88, 255));
    let style = MonoTextStyle::new(&FONT_6X10, Rgb888::WHITE);
    if let Err(e) = Text::with_baseline("R", Point::new(5, 3), style, Baseline::Top).draw(&mut canvas) {
        match e {}
    }
    encode_png(&canvas.into_image())
}
