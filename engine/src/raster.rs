use image::{Rgba as Pixel, RgbaImage};
use kurbo::{Affine, BezPath, Point, Rect, Shape, Size};
use crate::image_ops::{apply_filter, blend, color_or_black, Rgba};
use crate::objects::BackgroundImage;
use crate::surface::Surface;
use crate::text::{MonospaceMeasure, TextMeasure};
use crate::types::{CompositeMode, FilterValues};

/// Headless `Surface` over an RGBA buffer. A device pixel is painted when its center
/// falls inside the shape, which keeps output deterministic for tests and native
/// exports. Text is drawn as one solid box per glyph on a fixed advance.
#[derive(Clone, Debug)]
pub struct RasterSurface {
    pixels: RgbaImage,
    transform: Affine,
    filter: Option<FilterValues>,
    composite: CompositeMode,
    measure: MonospaceMeasure,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        RasterSurface {
            pixels: RgbaImage::new(width, height),
            transform: Affine::IDENTITY,
            filter: None,
            composite: CompositeMode::SourceOver,
            measure: MonospaceMeasure::default(),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels.get_pixel(x, y).0
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[3] != 0).count()
    }

    fn paint<F>(&mut self, bounds: Rect, color: Rgba, hit: F)
    where
        F: Fn(Point) -> bool,
    {
        let Some((x0, y0, x1, y1)) = self.device_span(bounds) else { return };
        let inv = self.transform.inverse();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = inv * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if hit(p) {
                    let dst = self.pixels.get_pixel(x, y).0;
                    self.pixels.put_pixel(x, y, Pixel(blend(dst, color, 1.0, self.composite)));
                }
            }
        }
    }

    /// Device pixel range covering `bounds` (given in user space).
    fn device_span(&self, bounds: Rect) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = (self.pixels.width() as f64, self.pixels.height() as f64);
        let dev = self.transform.transform_rect_bbox(bounds);
        let x0 = dev.x0.floor().max(0.0);
        let y0 = dev.y0.floor().max(0.0);
        let x1 = dev.x1.ceil().min(w);
        let y1 = dev.y1.ceil().min(h);
        if !(x0 < x1 && y0 < y1) {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 <= f64::EPSILON {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

fn points_bounds(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    Some(points.iter().fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)))
}

impl TextMeasure for RasterSurface {
    fn measure(&self, text: &str, font_size: f64, font: &str) -> f64 {
        self.measure.measure(text, font_size, font)
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(self.pixels.width() as f64, self.pixels.height() as f64)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
    }

    fn clear(&mut self) {
        for p in self.pixels.pixels_mut() {
            *p = Pixel([0, 0, 0, 0]);
        }
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_filter(&mut self, filter: Option<FilterValues>) {
        self.filter = filter;
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }

    fn stroke_polyline(&mut self, points: &[Point], color: &str, width: f64) {
        let Some(bounds) = points_bounds(points) else { return };
        let half = width / 2.0;
        let color = color_or_black(color);
        let pts = points.to_vec();
        self.paint(bounds.inflate(half, half), color, |p| {
            if pts.len() == 1 {
                return (p - pts[0]).hypot() <= half;
            }
            pts.windows(2).any(|w| segment_distance(p, w[0], w[1]) <= half)
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: &str) {
        let bounds = Rect::from_center_size(center, (radius * 2.0, radius * 2.0));
        self.paint(bounds, color_or_black(color), |p| (p - center).hypot() <= radius);
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, color: &str, width: f64) {
        let half = width / 2.0;
        let outer = radius + half;
        let bounds = Rect::from_center_size(center, (outer * 2.0, outer * 2.0));
        self.paint(bounds, color_or_black(color), |p| ((p - center).hypot() - radius).abs() <= half);
    }

    fn fill_polygon(&mut self, points: &[Point], color: &str) {
        let Some(bounds) = points_bounds(points) else { return };
        if points.len() < 3 {
            return;
        }
        let mut path = BezPath::new();
        path.move_to(points[0]);
        for p in &points[1..] {
            path.line_to(*p);
        }
        path.close_path();
        self.paint(bounds, color_or_black(color), |p| path.contains(p));
    }

    fn stroke_rect(&mut self, rect: Rect, color: &str, width: f64) {
        let half = width / 2.0;
        let outer = rect.inflate(half, half);
        let inner = rect.inflate(-half, -half);
        self.paint(outer, color_or_black(color), |p| {
            outer.contains(p) && !(inner.width() > 0.0 && inner.height() > 0.0 && inner.contains(p))
        });
    }

    fn draw_image(&mut self, image: &BackgroundImage) {
        let source = match &self.filter {
            Some(f) => apply_filter(&image.pixels, f),
            None => (*image.pixels).clone(),
        };
        let bounds = Rect::new(0.0, 0.0, source.width() as f64, source.height() as f64);
        let Some((x0, y0, x1, y1)) = self.device_span(bounds) else { return };
        let inv = self.transform.inverse();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = inv * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if !bounds.contains(p) {
                    continue;
                }
                let (sx, sy) = (p.x.floor() as u32, p.y.floor() as u32);
                if sx >= source.width() || sy >= source.height() {
                    continue;
                }
                let src = source.get_pixel(sx, sy).0;
                let dst = self.pixels.get_pixel(x, y).0;
                self.pixels.put_pixel(x, y, Pixel(blend(dst, src, 1.0, self.composite)));
            }
        }
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &str, font_size: f64, color: &str) {
        let advance = self.measure(" ", font_size, font);
        let inset = font_size * 0.1;
        let color = color_or_black(color);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x = origin.x + i as f64 * advance;
            let glyph = Rect::new(x + inset, origin.y + inset, x + advance - inset, origin.y + font_size - inset);
            self.paint(glyph, color, |p| glyph.contains(p));
        }
    }

    fn snapshot(&self) -> Option<RgbaImage> {
        Some(self.pixels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_and_strokes_under_transform() {
        let mut s = RasterSurface::new(20, 20);
        s.fill_circle(Point::new(10.0, 10.0), 3.0, "#ff0000");
        assert_eq!(s.pixel(10, 10), [255, 0, 0, 255]);
        assert_eq!(s.pixel(1, 1)[3], 0);

        s.clear();
        s.set_transform(Affine::scale(2.0));
        s.stroke_polyline(&[Point::new(1.0, 5.0), Point::new(9.0, 5.0)], "#0000ff", 1.0);
        assert_eq!(s.pixel(10, 10), [0, 0, 255, 255]);
        assert_eq!(s.pixel(10, 4)[3], 0);
    }

    #[test]
    fn named_and_functional_colors_paint_their_value() {
        let cases = [
            ("cyan", [0, 255, 255, 255]),
            ("magenta", [255, 0, 255, 255]),
            ("rgb(255 0 0)", [255, 0, 0, 255]),
            ("hsl(120, 100%, 50%)", [0, 255, 0, 255]),
            ("not-a-color", [0, 0, 0, 255]),
        ];
        for (color, expected) in cases {
            let mut s = RasterSurface::new(10, 10);
            s.fill_circle(Point::new(5.0, 5.0), 3.0, color);
            assert_eq!(s.pixel(5, 5), expected, "{}", color);
        }
    }

    #[test]
    fn destination_out_erases() {
        let mut s = RasterSurface::new(10, 10);
        s.fill_polygon(&[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0), Point::new(0.0, 10.0)], "black");
        assert_eq!(s.painted_count(), 100);
        s.set_composite(CompositeMode::DestinationOut);
        s.fill_circle(Point::new(5.0, 5.0), 2.0, "#000");
        assert_eq!(s.pixel(5, 5)[3], 0);
        assert_eq!(s.pixel(0, 0)[3], 255);
    }

    #[test]
    fn image_draw_uses_filter() {
        let mut img = RgbaImage::new(4, 4);
        for p in img.pixels_mut() {
            *p = Pixel([200, 100, 50, 255]);
        }
        let bg = BackgroundImage::new(1, img);
        let mut s = RasterSurface::new(4, 4);
        s.set_filter(Some(FilterValues { brightness: 50.0, ..FilterValues::default() }));
        s.draw_image(&bg);
        assert_eq!(s.pixel(2, 2), [100, 50, 25, 255]);
    }

    #[test]
    fn text_glyphs_land_inside_measured_box() {
        let mut s = RasterSurface::new(40, 20);
        s.fill_text("ab", Point::new(0.0, 0.0), "Arial", 10.0, "#000000");
        assert_eq!(s.measure("ab", 10.0, "Arial"), 12.0);
        assert_eq!(s.pixel(3, 5)[3], 255);
        assert_eq!(s.pixel(20, 5)[3], 0);
    }
}
