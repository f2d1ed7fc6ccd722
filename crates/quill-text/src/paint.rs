//! Pixel surface abstraction.
//!
//! Layout coordinates are `f32`; surfaces are whole pixels. Every drawing
//! helper rounds to the pixel grid and clips to the surface, so callers can
//! pass rectangles that hang off any edge.

use image::{Rgba, RgbaImage};

use crate::colour::{Colour, ColourGradient};
use crate::font::GlyphBitmap;
use crate::geometry::Rect;

/// A 2D RGBA pixel buffer with straight alpha.
///
/// Implementors provide pixel access; the drawing operations are provided.
pub trait Surface {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Read a pixel. Coordinates are within [`dimensions`](Self::dimensions).
    fn pixel(&self, x: u32, y: u32) -> Colour;

    /// Write a pixel. Coordinates are within [`dimensions`](Self::dimensions).
    fn put(&mut self, x: u32, y: u32, colour: Colour);

    /// Composite `colour` over the pixel at `(x, y)`, ignoring positions off
    /// the surface.
    fn blend(&mut self, x: i64, y: i64, colour: Colour) {
        let Some((x, y)) = self.clip_point(x, y) else {
            return;
        };
        let under = self.pixel(x, y);
        self.put(x, y, composite_over(colour, under));
    }

    /// Overwrite every pixel in `rect` with `colour`. Filling with
    /// [`Colour::TRANSPARENT`] clears.
    fn fill_rect(&mut self, rect: Rect, colour: Colour) {
        for (x, y) in self.covered_pixels(rect) {
            self.put(x, y, colour);
        }
    }

    /// Composite `colour` over every pixel in `rect`.
    fn blend_rect(&mut self, rect: Rect, colour: Colour) {
        if colour.a == 0 {
            return;
        }
        for (x, y) in self.covered_pixels(rect) {
            let under = self.pixel(x, y);
            self.put(x, y, composite_over(colour, under));
        }
    }

    /// Composite a gradient stretched over `rect`.
    fn blend_gradient(&mut self, rect: Rect, gradient: &ColourGradient) {
        for (x, y) in self.covered_pixels(rect) {
            #[allow(clippy::cast_precision_loss)]
            let colour = gradient.colour_at_point(&rect, x as f32 + 0.5, y as f32 + 0.5);
            let under = self.pixel(x, y);
            self.put(x, y, composite_over(colour, under));
        }
    }

    /// Draw glyph coverage with its top-left corner at `(x, y)`, tinted by
    /// `colour`.
    fn blit_coverage(&mut self, x: i64, y: i64, glyph: &GlyphBitmap, colour: Colour) {
        for gy in 0..glyph.height {
            for gx in 0..glyph.width {
                let coverage = glyph.coverage[gy * glyph.width + gx];
                if coverage == 0 {
                    continue;
                }
                let tinted = Colour {
                    a: colour.multiply(Colour::rgba(255, 255, 255, coverage)).a,
                    ..colour
                };
                #[allow(clippy::cast_possible_wrap)]
                self.blend(x + gx as i64, y + gy as i64, tinted);
            }
        }
    }

    /// Draw `image` scaled to `rect` with nearest-neighbour sampling.
    fn blit_image(&mut self, rect: Rect, image: &RgbaImage) {
        let (src_w, src_h) = image.dimensions();
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(rect) else {
            return;
        };
        if src_w == 0 || src_h == 0 {
            return;
        }
        let dest_x = rect.x.round();
        let dest_y = rect.y.round();
        let dest_w = rect.width.round().max(1.0);
        let dest_h = rect.height.round().max(1.0);
        for y in y0..y1 {
            for x in x0..x1 {
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let (sx, sy) = (
                    (((x as f32 - dest_x) / dest_w) * src_w as f32).floor().max(0.0) as u32,
                    (((y as f32 - dest_y) / dest_h) * src_h as f32).floor().max(0.0) as u32,
                );
                let Rgba([r, g, b, a]) = *image.get_pixel(sx.min(src_w - 1), sy.min(src_h - 1));
                if a == 0 {
                    continue;
                }
                let under = self.pixel(x, y);
                self.put(x, y, composite_over(Colour::rgba(r, g, b, a), under));
            }
        }
    }

    /// Multiply every pixel by `colour`, channel by channel. Multiplying by
    /// `(255, 255, 255, alpha)` fades the whole surface.
    fn multiply(&mut self, colour: Colour) {
        let (width, height) = self.dimensions();
        for y in 0..height {
            for x in 0..width {
                let pixel = self.pixel(x, y);
                self.put(x, y, pixel.multiply(colour));
            }
        }
    }

    /// Clear the whole surface to transparent.
    fn clear(&mut self) {
        let (width, height) = self.dimensions();
        #[allow(clippy::cast_precision_loss)]
        self.fill_rect(
            Rect::new(0.0, 0.0, width as f32, height as f32),
            Colour::TRANSPARENT,
        );
    }

    /// Pixel-space `(x0, y0, x1, y1)` covered by `rect`, clipped to the
    /// surface, or `None` when nothing is covered.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn pixel_bounds(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let (width, height) = self.dimensions();
        let x0 = rect.x.round().clamp(0.0, width as f32) as u32;
        let y0 = rect.y.round().clamp(0.0, height as f32) as u32;
        let x1 = rect.right().round().clamp(0.0, width as f32) as u32;
        let y1 = rect.bottom().round().clamp(0.0, height as f32) as u32;
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    /// Every pixel covered by `rect`, row by row.
    fn covered_pixels(&self, rect: Rect) -> Vec<(u32, u32)> {
        self.pixel_bounds(rect)
            .map(|(x0, y0, x1, y1)| {
                (y0..y1)
                    .flat_map(|y| (x0..x1).map(move |x| (x, y)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Convert signed coordinates to a pixel position on the surface.
    fn clip_point(&self, x: i64, y: i64) -> Option<(u32, u32)> {
        let (width, height) = self.dimensions();
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        (x < width && y < height).then_some((x, y))
    }
}

impl Surface for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn pixel(&self, x: u32, y: u32) -> Colour {
        let Rgba([r, g, b, a]) = *self.get_pixel(x, y);
        Colour::rgba(r, g, b, a)
    }

    fn put(&mut self, x: u32, y: u32, colour: Colour) {
        self.put_pixel(x, y, Rgba([colour.r, colour.g, colour.b, colour.a]));
    }
}

/// Porter-Duff "over" for straight-alpha colours.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn composite_over(src: Colour, dst: Colour) -> Colour {
    if src.a == 255 || dst.a == 0 {
        return src;
    }
    if src.a == 0 {
        return dst;
    }
    let sa = f32::from(src.a) / 255.0;
    let da = f32::from(dst.a) / 255.0;
    let out_a = da.mul_add(1.0 - sa, sa);
    let channel = |s: u8, d: u8| {
        let value = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Colour::rgba(
        channel(src.r, dst.r),
        channel(src.g, dst.g),
        channel(src.b, dst.b),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(width: u32, height: u32) -> RgbaImage {
        RgbaImage::new(width, height)
    }

    #[test]
    fn fill_rect_clips_to_surface() {
        let mut surface = canvas(4, 4);
        surface.fill_rect(Rect::new(-2.0, -2.0, 4.0, 4.0), Colour::WHITE);
        assert_eq!(surface.pixel(0, 0), Colour::WHITE);
        assert_eq!(surface.pixel(1, 1), Colour::WHITE);
        assert_eq!(surface.pixel(2, 2), Colour::TRANSPARENT);
    }

    #[test]
    fn blend_over_transparent_takes_source() {
        let mut surface = canvas(1, 1);
        surface.blend(0, 0, Colour::rgba(10, 20, 30, 128));
        assert_eq!(surface.pixel(0, 0), Colour::rgba(10, 20, 30, 128));
        surface.blend(5, 5, Colour::WHITE);
    }

    #[test]
    fn composite_half_white_over_black() {
        let out = composite_over(Colour::rgba(255, 255, 255, 128), Colour::BLACK);
        assert_eq!(out.a, 255);
        assert_eq!(out.r, 128);
    }

    #[test]
    fn multiply_fades_alpha_only() {
        let mut surface = canvas(2, 1);
        surface.fill_rect(Rect::new(0.0, 0.0, 2.0, 1.0), Colour::rgb(200, 100, 50));
        surface.multiply(Colour::rgba(255, 255, 255, 51));
        assert_eq!(surface.pixel(1, 0), Colour::rgba(200, 100, 50, 51));
    }

    #[test]
    fn coverage_is_tinted() {
        let mut surface = canvas(3, 3);
        let glyph = GlyphBitmap {
            width: 2,
            height: 1,
            left: 0,
            top: 1,
            coverage: vec![255, 0],
        };
        surface.blit_coverage(1, 1, &glyph, Colour::rgb(255, 0, 0));
        assert_eq!(surface.pixel(1, 1), Colour::rgb(255, 0, 0));
        assert_eq!(surface.pixel(2, 1), Colour::TRANSPARENT);
    }

    #[test]
    fn image_is_scaled() {
        let mut source = RgbaImage::new(1, 1);
        source.put_pixel(0, 0, Rgba([0, 255, 0, 255]));
        let mut surface = canvas(4, 4);
        surface.blit_image(Rect::new(1.0, 1.0, 2.0, 2.0), &source);
        assert_eq!(surface.pixel(1, 1), Colour::rgb(0, 255, 0));
        assert_eq!(surface.pixel(2, 2), Colour::rgb(0, 255, 0));
        assert_eq!(surface.pixel(3, 3), Colour::TRANSPARENT);
    }

    #[test]
    fn gradient_fill_runs_left_to_right() {
        let mut surface = canvas(10, 1);
        let gradient = ColourGradient::new(0.0, vec![Colour::BLACK, Colour::WHITE]);
        surface.blend_gradient(Rect::new(0.0, 0.0, 10.0, 1.0), &gradient);
        assert!(surface.pixel(0, 0).r < 30);
        assert!(surface.pixel(9, 0).r > 225);
    }
}
