use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};
use image::RgbaImage;
use kurbo::{Affine, Point, Rect, Size};
use crate::error::{EditorError, EditorResult};
use crate::image_ops::filter_css_string;
use crate::objects::BackgroundImage;
use crate::surface::Surface;
use crate::text::TextMeasure;
use crate::types::{CompositeMode, FilterValues};

/// `Surface` backed by a browser `<canvas>` 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    transform: Affine,
    // Offscreen copy of the last drawn background, keyed by image id.
    bitmap: Option<(u32, HtmlCanvasElement)>,
}

fn context_2d(canvas: &HtmlCanvasElement) -> EditorResult<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")?
        .ok_or(EditorError::ContextUnavailable("2d"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| EditorError::ContextUnavailable("2d"))
}

// Canvas calls only fail on invalid arguments; keep drawing and leave a trace.
fn check(result: Result<(), JsValue>, what: &str) {
    if let Err(e) = result {
        log::debug!("canvas {} failed: {:?}", what, e);
    }
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> EditorResult<Self> {
        let ctx = context_2d(&canvas)?;
        Ok(CanvasSurface { canvas, ctx, transform: Affine::IDENTITY, bitmap: None })
    }

    pub fn element(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn bitmap_for(&mut self, image: &BackgroundImage) -> EditorResult<HtmlCanvasElement> {
        if let Some((id, canvas)) = &self.bitmap {
            if *id == image.id {
                return Ok(canvas.clone());
            }
        }
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(EditorError::ContextUnavailable("document"))?;
        let offscreen = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| EditorError::ContextUnavailable("offscreen canvas"))?;
        offscreen.set_width(image.width());
        offscreen.set_height(image.height());
        let data = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(image.pixels.as_raw().as_slice()),
            image.width(),
            image.height(),
        )?;
        context_2d(&offscreen)?.put_image_data(&data, 0.0, 0.0)?;
        self.bitmap = Some((image.id, offscreen.clone()));
        Ok(offscreen)
    }

    fn apply_transform(&self) {
        let [a, b, c, d, e, f] = self.transform.as_coeffs();
        check(self.ctx.set_transform(a, b, c, d, e, f), "set_transform");
    }
}

impl TextMeasure for CanvasSurface {
    fn measure(&self, text: &str, font_size: f64, font: &str) -> f64 {
        self.ctx.save();
        self.ctx.set_font(&format!("{}px {}", font_size, font));
        let width = self.ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0);
        self.ctx.restore();
        width
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Size {
        Size::new(self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        // Resizing resets the context state.
        self.apply_transform();
    }

    fn clear(&mut self) {
        self.ctx.save();
        check(self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0), "set_transform");
        let size = self.size();
        self.ctx.clear_rect(0.0, 0.0, size.width, size.height);
        self.ctx.restore();
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
        self.apply_transform();
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_filter(&mut self, filter: Option<FilterValues>) {
        match filter {
            Some(f) => self.ctx.set_filter(&filter_css_string(&f)),
            None => self.ctx.set_filter("none"),
        }
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        check(self.ctx.set_global_composite_operation(mode.as_css()), "composite");
    }

    fn stroke_polyline(&mut self, points: &[Point], color: &str, width: f64) {
        let Some(first) = points.first() else { return };
        self.ctx.begin_path();
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(width);
        self.ctx.move_to(first.x, first.y);
        for p in &points[1..] {
            self.ctx.line_to(p.x, p.y);
        }
        self.ctx.stroke();
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: &str) {
        self.ctx.begin_path();
        self.ctx.set_fill_style_str(color);
        check(self.ctx.arc(center.x, center.y, radius, 0.0, std::f64::consts::PI * 2.0), "arc");
        self.ctx.fill();
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, color: &str, width: f64) {
        self.ctx.begin_path();
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(width);
        check(self.ctx.arc(center.x, center.y, radius, 0.0, std::f64::consts::PI * 2.0), "arc");
        self.ctx.stroke();
    }

    fn fill_polygon(&mut self, points: &[Point], color: &str) {
        let Some(first) = points.first() else { return };
        self.ctx.begin_path();
        self.ctx.set_fill_style_str(color);
        self.ctx.move_to(first.x, first.y);
        for p in &points[1..] {
            self.ctx.line_to(p.x, p.y);
        }
        self.ctx.close_path();
        self.ctx.fill();
    }

    fn stroke_rect(&mut self, rect: Rect, color: &str, width: f64) {
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(width);
        self.ctx.stroke_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn draw_image(&mut self, image: &BackgroundImage) {
        match self.bitmap_for(image) {
            Ok(bitmap) => check(self.ctx.draw_image_with_html_canvas_element(&bitmap, 0.0, 0.0), "draw_image"),
            Err(e) => log::warn!("background bitmap unavailable: {}", e),
        }
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &str, font_size: f64, color: &str) {
        self.ctx.set_font(&format!("{}px {}", font_size, font));
        self.ctx.set_text_baseline("top");
        self.ctx.set_fill_style_str(color);
        check(self.ctx.fill_text(text, origin.x, origin.y), "fill_text");
    }

    fn snapshot(&self) -> Option<RgbaImage> {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if w == 0 || h == 0 {
            return None;
        }
        let data = self.ctx.get_image_data(0.0, 0.0, w as f64, h as f64).ok()?;
        RgbaImage::from_raw(w, h, data.data().0)
    }
}
