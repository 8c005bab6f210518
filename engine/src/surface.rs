use image::RgbaImage;
use kurbo::{Affine, Point, Rect, Size};
use crate::objects::BackgroundImage;
use crate::text::TextMeasure;
use crate::types::{CompositeMode, FilterValues};

/// Drawing context of one layer. Implemented by the browser canvas and by the
/// headless rasterizer. Coordinates passed to the drawing calls are in the space set
/// by the last `set_transform`.
pub trait Surface: TextMeasure {
    fn size(&self) -> Size;

    /// Resizes the backing store, which also clears it.
    fn resize(&mut self, width: u32, height: u32);

    /// Clears the whole backing store, ignoring the current transform.
    fn clear(&mut self);

    fn set_transform(&mut self, transform: Affine);

    fn transform(&self) -> Affine;

    /// Filter applied to subsequent image draws. `None` resets it.
    fn set_filter(&mut self, filter: Option<FilterValues>);

    fn set_composite(&mut self, mode: CompositeMode);

    /// Round caps and joins.
    fn stroke_polyline(&mut self, points: &[Point], color: &str, width: f64);

    fn fill_circle(&mut self, center: Point, radius: f64, color: &str);

    fn stroke_circle(&mut self, center: Point, radius: f64, color: &str, width: f64);

    fn fill_polygon(&mut self, points: &[Point], color: &str);

    fn stroke_rect(&mut self, rect: Rect, color: &str, width: f64);

    /// Draws the image at the origin at its natural size.
    fn draw_image(&mut self, image: &BackgroundImage);

    /// Top-left baseline convention: `origin` is the top-left of the line box.
    fn fill_text(&mut self, text: &str, origin: Point, font: &str, font_size: f64, color: &str);

    /// Copy of the backing store. `None` when the surface cannot be read.
    fn snapshot(&self) -> Option<RgbaImage>;
}
