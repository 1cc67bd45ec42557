//! Frame Buffer
//!
//! RGBA pixel frames shared by both rendering modes. Sprite mode composites
//! whole frames (cross-fade), procedural mode draws primitives into one.
//!
//! Coordinates are in pixels with the origin at the top-left corner. Drawing
//! outside the frame is clipped silently.

use serde::{Deserialize, Serialize};

/// An opaque RGB color triple
///
/// Serialized as a three-element array (`[r, g, b]`) so presets read the
/// same in TOML as they do in code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Pure black
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Interpolate per component, rounding to the nearest channel value
    #[must_use]
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let v = f32::from(a) + (f32::from(b) - f32::from(a)) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    /// Fully opaque pixel of this color
    #[must_use]
    pub const fn opaque(self) -> Rgba {
        Rgba::new(self.0, self.1, self.2, 255)
    }
}

/// A single RGBA pixel (straight, non-premultiplied alpha)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (0 = transparent)
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    /// Create a pixel
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Drop the alpha channel
    #[must_use]
    pub const fn rgb(self) -> Rgb {
        Rgb(self.r, self.g, self.b)
    }

    /// Weighted mix of two pixels: `self * (1 - t) + other * t`, all channels
    #[must_use]
    pub fn mix(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| -> u8 {
            (f32::from(a) * (1.0 - t) + f32::from(b) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgba::new(
            ch(self.r, other.r),
            ch(self.g, other.g),
            ch(self.b, other.b),
            ch(self.a, other.a),
        )
    }
}

/// A width x height grid of RGBA pixels (row-major)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Frame {
    /// Create a fully transparent frame
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    /// Create a frame filled with one color
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Convert a decoded image into a frame
    #[must_use]
    pub fn from_rgba_image(image: &image::RgbaImage) -> Self {
        let pixels = image
            .pixels()
            .map(|p| Rgba::new(p.0[0], p.0[1], p.0[2], p.0[3]))
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            pixels,
        }
    }

    /// Width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel slice (row-major)
    #[must_use]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Pixel at a position, `None` when out of bounds
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        self.index(x as i32, y as i32).map(|i| self.pixels[i])
    }

    /// Overwrite a pixel (clipped)
    pub fn set(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Fill the whole frame
    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Paint `color` over the existing pixel with the given coverage
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let dst = self.pixels[i];
        let src = Rgba::new(color.0, color.1, color.2, 255);
        let mut out = dst.mix(src, alpha);
        // Painting never makes a pixel more transparent
        out.a = out.a.max(dst.a);
        self.pixels[i] = out;
    }

    /// Filled axis-aligned ellipse
    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgb) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let (x0, x1) = ((cx - rx).floor() as i32, (cx + rx).ceil() as i32);
        let (y0, y1) = ((cy - ry).floor() as i32, (cy + ry).ceil() as i32);
        let px = color.opaque();
        for y in y0..=y1 {
            let ny = (y as f32 + 0.5 - cy) / ry;
            for x in x0..=x1 {
                let nx = (x as f32 + 0.5 - cx) / rx;
                if nx * nx + ny * ny <= 1.0 {
                    self.set(x, y, px);
                }
            }
        }
    }

    /// Filled circle
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb) {
        self.fill_ellipse(cx, cy, radius, radius, color);
    }

    /// Thick line segment with round caps
    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Rgb) {
        let half = (thickness / 2.0).max(0.5);
        let (ax, ay) = from;
        let (bx, by) = to;
        let x0 = (ax.min(bx) - half).floor() as i32;
        let x1 = (ax.max(bx) + half).ceil() as i32;
        let y0 = (ay.min(by) - half).floor() as i32;
        let y1 = (ay.max(by) + half).ceil() as i32;

        let (vx, vy) = (bx - ax, by - ay);
        let len_sq = vx * vx + vy * vy;
        let px = color.opaque();

        for y in y0..=y1 {
            for x in x0..=x1 {
                let (sx, sy) = (x as f32 + 0.5, y as f32 + 0.5);
                let t = if len_sq > f32::EPSILON {
                    (((sx - ax) * vx + (sy - ay) * vy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (qx, qy) = (ax + vx * t, ay + vy * t);
                let d_sq = (sx - qx) * (sx - qx) + (sy - qy) * (sy - qy);
                if d_sq <= half * half {
                    self.set(x, y, px);
                }
            }
        }
    }

    /// Connected thick line through the given points
    pub fn draw_polyline(&mut self, points: &[(f32, f32)], thickness: f32, color: Rgb) {
        for pair in points.windows(2) {
            self.draw_line(pair[0], pair[1], thickness, color);
        }
    }

    /// Rectangle outline painted with partial coverage
    ///
    /// The stroke is centered on the rectangle edge, matching how the
    /// listening glow frames the face.
    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        thickness: f32,
        color: Rgb,
        alpha: f32,
    ) {
        let half = thickness / 2.0;
        let (left, right) = (x, x + width);
        let (top, bottom) = (y, y + height);
        let x0 = (left - half).floor() as i32;
        let x1 = (right + half).ceil() as i32;
        let y0 = (top - half).floor() as i32;
        let y1 = (bottom + half).ceil() as i32;

        for py in y0..=y1 {
            for px in x0..=x1 {
                let (sx, sy) = (px as f32 + 0.5, py as f32 + 0.5);
                let inside_outer = sx >= left - half
                    && sx <= right + half
                    && sy >= top - half
                    && sy <= bottom + half;
                let inside_inner = sx > left + half
                    && sx < right - half
                    && sy > top + half
                    && sy < bottom - half;
                if inside_outer && !inside_inner {
                    self.blend_pixel(px, py, color, alpha);
                }
            }
        }
    }

    /// Cross-fade two frames: `b` at opacity `alpha` over `a` at `1 - alpha`
    ///
    /// The result takes the dimensions of `a`; pixels of `b` outside its own
    /// bounds count as transparent.
    #[must_use]
    pub fn cross_fade(a: &Frame, b: &Frame, alpha: f32) -> Frame {
        let alpha = alpha.clamp(0.0, 1.0);
        let mut out = Frame::new(a.width, a.height);
        for y in 0..a.height {
            for x in 0..a.width {
                let i = y as usize * a.width as usize + x as usize;
                let pa = a.pixels[i];
                let pb = b.get(x, y).unwrap_or(Rgba::TRANSPARENT);
                out.pixels[i] = pa.mix(pb, alpha);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_lerp_endpoints() {
        let a = Rgb(0, 100, 200);
        let b = Rgb(100, 200, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb(50, 150, 100));
        // Out of range factors clamp
        assert_eq!(a.lerp(b, 7.0), b);
    }

    #[test]
    fn test_cross_fade_midpoint() {
        let a = Frame::filled(4, 3, Rgba::new(0, 0, 0, 255));
        let b = Frame::filled(4, 3, Rgba::new(200, 100, 50, 255));
        let out = Frame::cross_fade(&a, &b, 0.5);
        assert_eq!(out.get(2, 1), Some(Rgba::new(100, 50, 25, 255)));
    }

    #[test]
    fn test_cross_fade_clamps_alpha() {
        let a = Frame::filled(2, 2, Rgba::new(10, 10, 10, 255));
        let b = Frame::filled(2, 2, Rgba::new(250, 250, 250, 255));
        assert_eq!(Frame::cross_fade(&a, &b, -1.0), a);
        assert_eq!(Frame::cross_fade(&a, &b, 2.0), b);
    }

    #[test]
    fn test_drawing_is_clipped() {
        let mut frame = Frame::new(10, 10);
        frame.fill_circle(0.0, 0.0, 5.0, Rgb(255, 0, 0));
        frame.draw_line((-20.0, 5.0), (30.0, 5.0), 2.0, Rgb(0, 255, 0));
        assert_eq!(frame.get(0, 0), Some(Rgba::new(255, 0, 0, 255)));
        assert_eq!(frame.get(9, 5), Some(Rgba::new(0, 255, 0, 255)));
        assert_eq!(frame.get(10, 5), None);
    }

    #[test]
    fn test_ellipse_leaves_corners_untouched() {
        let mut frame = Frame::new(21, 11);
        frame.fill_ellipse(10.5, 5.5, 10.0, 5.0, Rgb(1, 2, 3));
        assert_eq!(frame.get(10, 5), Some(Rgba::new(1, 2, 3, 255)));
        assert_eq!(frame.get(0, 0), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_stroke_rect_blends_edges_only() {
        let mut frame = Frame::filled(20, 20, Rgba::new(0, 0, 0, 255));
        frame.stroke_rect(2.0, 2.0, 16.0, 16.0, 2.0, Rgb(200, 0, 0), 0.5);
        assert_eq!(frame.get(2, 10), Some(Rgba::new(100, 0, 0, 255)));
        assert_eq!(frame.get(10, 10), Some(Rgba::new(0, 0, 0, 255)));
    }
}
