use kurbo::{Affine, Point, Size, Vec2};
use serde::{Serialize, Deserialize};
use crate::types::ScaleValues;

const MIN_ZOOM: f64 = 1e-6;

/// Rendered (CSS) box of a canvas element in client coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        ClientRect { left, top, width, height }
    }

    /// A rect whose CSS size equals the backing-store size.
    pub fn unscaled(size: Size) -> Self {
        ClientRect { left: 0.0, top: 0.0, width: size.width, height: size.height }
    }
}

/// Backing-store size of every layer and the CSS size the host should give the elements.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct CanvasLayout {
    pub pixel_size: Size,
    pub css_size: Size,
}

impl CanvasLayout {
    /// Layout for a free canvas that simply fills its container.
    pub fn free(container: Size) -> Self {
        CanvasLayout { pixel_size: container, css_size: container }
    }

    /// Pixel size is the image's natural size; the CSS size fits its aspect ratio inside
    /// the part of the container the canvas occupies (`fix_css_width` of its width).
    pub fn fit(natural: Size, container: Size, fix_css_width: f64) -> Self {
        let avail_w = container.width * fix_css_width;
        let avail_h = container.height;
        if natural.width <= 0.0 || natural.height <= 0.0 || avail_w <= 0.0 || avail_h <= 0.0 {
            return CanvasLayout { pixel_size: natural, css_size: natural };
        }
        let ratio = (avail_w / natural.width).min(avail_h / natural.height);
        CanvasLayout {
            pixel_size: natural,
            css_size: Size::new(natural.width * ratio, natural.height * ratio),
        }
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_size.width.round().max(0.0) as u32
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_size.height.round().max(0.0) as u32
    }
}

/// Composed view matrix shared by every layer:
/// rotate about the center, then flips, then pan and zoom centered on the canvas.
pub fn view_transform(scale: &ScaleValues, size: Size) -> Affine {
    let (w, h) = (size.width, size.height);
    let zoom = scale.zoom.max(MIN_ZOOM);
    let center = Vec2::new(w / 2.0, h / 2.0);

    let mut m = Affine::translate(center)
        * Affine::rotate(scale.rotate.to_radians())
        * Affine::translate(-center);
    if scale.flip_horizontal {
        m = m * Affine::translate((w, 0.0)) * Affine::scale_non_uniform(-1.0, 1.0);
    }
    if scale.flip_vertical {
        m = m * Affine::translate((0.0, h)) * Affine::scale_non_uniform(1.0, -1.0);
    }
    let pan = Vec2::new(
        (w - w * zoom) / 2.0 + scale.offset.x,
        (h - h * zoom) / 2.0 + scale.offset.y,
    );
    m * Affine::translate(pan) * Affine::scale(zoom)
}

/// Client coordinates to backing-store pixels, correcting for CSS scaling.
pub fn client_to_pixels(client: Point, rect: &ClientRect, pixel_size: Size) -> Point {
    let sx = if rect.width > 0.0 { pixel_size.width / rect.width } else { 1.0 };
    let sy = if rect.height > 0.0 { pixel_size.height / rect.height } else { 1.0 };
    Point::new((client.x - rect.left) * sx, (client.y - rect.top) * sy)
}

pub fn pixels_to_client(pixel: Point, rect: &ClientRect, pixel_size: Size) -> Point {
    let sx = if pixel_size.width > 0.0 { rect.width / pixel_size.width } else { 1.0 };
    let sy = if pixel_size.height > 0.0 { rect.height / pixel_size.height } else { 1.0 };
    Point::new(pixel.x * sx + rect.left, pixel.y * sy + rect.top)
}

pub fn pixels_to_canvas(pixel: Point, scale: &ScaleValues, size: Size) -> Point {
    view_transform(scale, size).inverse() * pixel
}

pub fn canvas_to_pixels(point: Point, scale: &ScaleValues, size: Size) -> Point {
    view_transform(scale, size) * point
}

/// Maps a pointer position to logical canvas space: undo CSS scaling, pan, zoom,
/// flips and rotation, in that order.
pub fn screen_to_canvas(client: Point, rect: &ClientRect, scale: &ScaleValues, size: Size) -> Point {
    pixels_to_canvas(client_to_pixels(client, rect, size), scale, size)
}

pub fn canvas_to_screen(point: Point, rect: &ClientRect, scale: &ScaleValues, size: Size) -> Point {
    pixels_to_client(canvas_to_pixels(point, scale, size), rect, size)
}

/// Offset change that moves the image by `pixel_delta` on screen under the current
/// flips and rotation.
pub fn pan_delta(pixel_delta: Vec2, scale: &ScaleValues, size: Size) -> Vec2 {
    let inv = view_transform(scale, size).inverse();
    let linear = (inv * pixel_delta.to_point()) - (inv * Point::ZERO);
    linear * scale.zoom.max(MIN_ZOOM)
}

pub fn dot_radius(line_width: f64) -> f64 {
    line_width / 2.0
}

pub fn circle_radius(center: Point, edge: Point) -> f64 {
    (edge - center).hypot()
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ArrowGeometry {
    pub shaft_start: Point,
    pub shaft_end: Point,
    pub head_left: Point,
    pub head_right: Point,
    pub tip: Point,
}

pub fn arrow_head_size(line_width: f64) -> f64 {
    8.0 + line_width * 1.5
}

/// Shaft shortened by the head length and an isosceles head whose tip is `p1`.
/// `None` for a zero-length arrow.
pub fn arrow_geometry(p0: Point, p1: Point, line_width: f64) -> Option<ArrowGeometry> {
    let d = p1 - p0;
    let length = d.hypot();
    if length <= f64::EPSILON {
        return None;
    }
    let head_size = arrow_head_size(line_width);
    let unit = d / length;
    let shaft_end = p1 - unit * head_size;

    let head_width = (head_size * 1.5).max(line_width * 2.5);
    let (cos, sin) = (unit.x, unit.y);
    let base = Point::new(p1.x - head_size * cos, p1.y - head_size * sin);
    let half = head_width / 2.0;
    Some(ArrowGeometry {
        shaft_start: p0,
        shaft_end,
        head_left: Point::new(base.x + half * sin, base.y - half * cos),
        head_right: Point::new(base.x - half * sin, base.y + half * cos),
        tip: p1,
    })
}
