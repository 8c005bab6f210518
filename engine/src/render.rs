use kurbo::{Affine, Point};
use crate::geometry::{arrow_geometry, circle_radius, dot_radius, view_transform};
use crate::objects::{DrawingObject, EditorState, TextObject};
use crate::surface::Surface;
use crate::text::text_metrics;
use crate::types::{CompositeMode, FilterValues, Layer, LayerSet, ScaleValues, Tool};

const SELECTION_COLOR: &str = "red";
const SELECTION_WIDTH: f64 = 2.0;
const ERASE_COLOR: &str = "#000000";

/// The four stacked surfaces of the editor. Any of them may be missing (not yet
/// mounted by the host); rendering skips missing layers.
pub struct Layers<S> {
    pub background: Option<S>,
    pub drawings: Option<S>,
    pub texts: Option<S>,
    pub interactions: Option<S>,
}

impl<S> Default for Layers<S> {
    fn default() -> Self {
        Layers { background: None, drawings: None, texts: None, interactions: None }
    }
}

impl<S: Surface> Layers<S> {
    pub fn new(background: S, drawings: S, texts: S, interactions: S) -> Self {
        Layers {
            background: Some(background),
            drawings: Some(drawings),
            texts: Some(texts),
            interactions: Some(interactions),
        }
    }

    pub fn get(&self, layer: Layer) -> Option<&S> {
        match layer {
            Layer::Background => self.background.as_ref(),
            Layer::Drawings => self.drawings.as_ref(),
            Layer::Texts => self.texts.as_ref(),
            Layer::Interactions => self.interactions.as_ref(),
        }
    }

    pub fn get_mut(&mut self, layer: Layer) -> Option<&mut S> {
        match layer {
            Layer::Background => self.background.as_mut(),
            Layer::Drawings => self.drawings.as_mut(),
            Layer::Texts => self.texts.as_mut(),
            Layer::Interactions => self.interactions.as_mut(),
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut S> {
        [&mut self.background, &mut self.drawings, &mut self.texts, &mut self.interactions]
            .into_iter()
            .filter_map(|s| s.as_mut())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        for surface in self.iter_mut() {
            surface.resize(width, height);
        }
    }
}

/// Transient, not-yet-committed content drawn on top of the document.
#[derive(Clone, Debug, Default)]
pub struct Preview<'a> {
    pub drawing: Option<&'a DrawingObject>,
    /// Replaces the text with the same id while it is being dragged.
    pub text: Option<&'a TextObject>,
}

/// Values shown instead of the committed ones: a pan drag in progress or slider
/// values waiting for their debounced commit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Overrides {
    pub scale: Option<ScaleValues>,
    pub filter: Option<FilterValues>,
}

pub struct Renderer {
    pub wrap_width: f64,
}

impl Renderer {
    pub fn new(wrap_width: f64) -> Self {
        Renderer { wrap_width }
    }

    /// Applies the view matrix to every present layer, then repaints the `dirty` ones.
    pub fn render_state<S: Surface>(
        &self,
        layers: &mut Layers<S>,
        state: &EditorState,
        dirty: LayerSet,
        overrides: &Overrides,
    ) {
        let scale = overrides.scale.unwrap_or_else(|| state.scale_values());
        for surface in layers.iter_mut() {
            let size = surface.size();
            surface.set_transform(view_transform(&scale, size));
        }
        if dirty.background {
            if let Some(surface) = layers.background.as_mut() {
                let filter = overrides.filter.unwrap_or_else(|| state.filter_values());
                self.render_background(surface, state, &filter);
            }
        }
        if dirty.drawings {
            if let Some(surface) = layers.drawings.as_mut() {
                self.render_drawings(surface, state, None);
            }
        }
        if dirty.texts {
            if let Some(surface) = layers.texts.as_mut() {
                self.render_texts(surface, state, None);
            }
        }
    }

    pub fn render_background<S: Surface>(&self, surface: &mut S, state: &EditorState, filter: &FilterValues) {
        surface.clear();
        let Some(bg) = &state.background else { return };
        surface.set_filter(if filter.is_neutral() { None } else { Some(*filter) });
        surface.draw_image(bg);
        surface.set_filter(None);
    }

    pub fn render_drawings<S: Surface>(&self, surface: &mut S, state: &EditorState, pending: Option<&DrawingObject>) {
        surface.clear();
        for drawing in state.drawings().chain(pending) {
            draw_drawing(surface, drawing);
        }
    }

    pub fn render_texts<S: Surface>(&self, surface: &mut S, state: &EditorState, dragged: Option<&TextObject>) {
        surface.clear();
        let view = surface.transform();
        for text in state.texts() {
            let text = match dragged {
                Some(d) if d.id == text.id => d,
                _ => text,
            };
            self.draw_text(surface, text, view, state.is_selected(text.id));
        }
        surface.set_transform(view);
    }

    /// Live layer: only the in-flight shape. Eraser strokes go to the drawings layer
    /// instead so the erase shows through.
    pub fn render_preview<S: Surface>(&self, layers: &mut Layers<S>, state: &EditorState, preview: &Preview) {
        if let Some(surface) = layers.interactions.as_mut() {
            surface.clear();
            if let Some(d) = preview.drawing.filter(|d| !d.erase) {
                draw_drawing(surface, d);
            }
        }
        if let Some(d) = preview.drawing.filter(|d| d.erase) {
            if let Some(surface) = layers.drawings.as_mut() {
                self.render_drawings(surface, state, Some(d));
            }
        }
        if let Some(t) = preview.text {
            if let Some(surface) = layers.texts.as_mut() {
                self.render_texts(surface, state, Some(t));
            }
        }
    }

    pub fn clear_preview<S: Surface>(&self, layers: &mut Layers<S>) {
        if let Some(surface) = layers.interactions.as_mut() {
            surface.clear();
        }
    }

    fn draw_text<S: Surface>(&self, surface: &mut S, text: &TextObject, view: Affine, selected: bool) {
        let local = Affine::translate(text.position.to_vec2())
            * Affine::rotate(text.rotation.to_radians())
            * Affine::scale(text.scale);
        surface.set_transform(view * local);
        let metrics = text_metrics(&*surface, text, self.wrap_width);
        for (i, line) in metrics.lines.iter().enumerate() {
            let origin = Point::new(0.0, i as f64 * metrics.line_height);
            surface.fill_text(line, origin, &text.font, text.font_size, &text.color);
        }
        if selected {
            surface.stroke_rect(metrics.local_box(), SELECTION_COLOR, SELECTION_WIDTH);
        }
    }
}

pub fn draw_drawing<S: Surface>(surface: &mut S, d: &DrawingObject) {
    if !d.has_enough_points() {
        return;
    }
    let color = if d.erase { ERASE_COLOR } else { d.color.as_str() };
    surface.set_composite(d.composite());
    match d.tool {
        Tool::Pen | Tool::Eraser => {
            if d.points.len() == 1 {
                surface.fill_circle(d.points[0], dot_radius(d.brush_size), color);
            } else {
                surface.stroke_polyline(&d.points, color, d.brush_size);
            }
        }
        Tool::Line => surface.stroke_polyline(&d.points[..2], color, d.brush_size),
        Tool::Circle => {
            let radius = circle_radius(d.points[0], d.points[1]);
            surface.stroke_circle(d.points[0], radius, color, d.brush_size);
        }
        Tool::Arrow => {
            if let Some(arrow) = arrow_geometry(d.points[0], d.points[1], d.brush_size) {
                surface.stroke_polyline(&[arrow.shaft_start, arrow.shaft_end], color, d.brush_size);
                surface.fill_polygon(&[arrow.tip, arrow.head_left, arrow.head_right], color);
            }
        }
    }
    surface.set_composite(CompositeMode::SourceOver);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use crate::objects::BackgroundImage;
    use crate::raster::RasterSurface;
    use image::{Rgba, RgbaImage};

    fn layers(w: u32, h: u32) -> Layers<RasterSurface> {
        Layers::new(RasterSurface::new(w, h), RasterSurface::new(w, h), RasterSurface::new(w, h), RasterSurface::new(w, h))
    }

    fn drawing(tool: Tool, points: &[(f64, f64)], erase: bool) -> DrawingObject {
        DrawingObject {
            id: 1,
            tool,
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            color: "#00ff00".to_string(),
            brush_size: 4.0,
            erase,
        }
    }

    fn layer(l: &Layers<RasterSurface>, which: Layer) -> &RasterSurface {
        l.get(which).unwrap()
    }

    #[test]
    fn shapes_paint_where_expected() {
        let mut s = RasterSurface::new(100, 100);
        draw_drawing(&mut s, &drawing(Tool::Line, &[(10.0, 50.0), (90.0, 50.0)], false));
        assert_eq!(s.pixel(50, 50), [0, 255, 0, 255]);

        s.clear();
        draw_drawing(&mut s, &drawing(Tool::Circle, &[(50.0, 50.0), (70.0, 50.0)], false));
        assert_eq!(s.pixel(70, 50)[3], 255);
        assert_eq!(s.pixel(50, 50)[3], 0);

        s.clear();
        draw_drawing(&mut s, &drawing(Tool::Pen, &[(20.0, 20.0)], false));
        assert_eq!(s.pixel(20, 20)[3], 255);

        s.clear();
        draw_drawing(&mut s, &drawing(Tool::Line, &[(20.0, 20.0)], false));
        assert_eq!(s.painted_count(), 0);
    }

    #[test]
    fn eraser_cuts_through_drawings() {
        let mut state = EditorState::default();
        state = Command::add_drawing(drawing(Tool::Line, &[(0.0, 10.0), (40.0, 10.0)], false)).apply(&state);
        let mut eraser = drawing(Tool::Eraser, &[(20.0, 0.0), (20.0, 20.0)], true);
        eraser.id = 2;
        state = Command::add_drawing(eraser).apply(&state);

        let mut l = layers(40, 20);
        Renderer::new(200.0).render_state(&mut l, &state, LayerSet::all(), &Overrides::default());
        let d = layer(&l, Layer::Drawings);
        assert_eq!(d.pixel(5, 10)[3], 255);
        assert_eq!(d.pixel(20, 10)[3], 0);
    }

    #[test]
    fn eraser_preview_renders_on_drawings_layer() {
        let mut state = EditorState::default();
        state = Command::add_drawing(drawing(Tool::Line, &[(0.0, 10.0), (40.0, 10.0)], false)).apply(&state);
        let mut l = layers(40, 20);
        let renderer = Renderer::new(200.0);
        renderer.render_state(&mut l, &state, LayerSet::all(), &Overrides::default());

        let eraser = drawing(Tool::Eraser, &[(20.0, 0.0), (20.0, 20.0)], true);
        renderer.render_preview(&mut l, &state, &Preview { drawing: Some(&eraser), text: None });
        assert_eq!(layer(&l, Layer::Drawings).pixel(20, 10)[3], 0);
        assert_eq!(layer(&l, Layer::Interactions).painted_count(), 0);

        let pen = drawing(Tool::Pen, &[(5.0, 5.0), (30.0, 5.0)], false);
        renderer.render_preview(&mut l, &state, &Preview { drawing: Some(&pen), text: None });
        assert_eq!(layer(&l, Layer::Interactions).pixel(10, 5)[3], 255);
    }

    #[test]
    fn background_gets_active_filter_and_view() {
        let mut img = RgbaImage::new(10, 10);
        for p in img.pixels_mut() {
            *p = Rgba([200, 100, 50, 255]);
        }
        let mut state = EditorState { background: Some(BackgroundImage::new(1, img)), ..EditorState::default() };
        state = Command::update_filters(2, FilterValues { brightness: 50.0, ..FilterValues::default() }).apply(&state);

        let mut l = layers(10, 10);
        Renderer::new(200.0).render_state(&mut l, &state, LayerSet::all(), &Overrides::default());
        assert_eq!(layer(&l, Layer::Background).pixel(4, 4), [100, 50, 25, 255]);

        let zoomed = ScaleValues { zoom: 0.5, ..ScaleValues::default() };
        Renderer::new(200.0).render_state(&mut l, &state, LayerSet::all(), &Overrides { scale: Some(zoomed), filter: None });
        let bg = layer(&l, Layer::Background);
        assert_eq!(bg.pixel(0, 0)[3], 0);
        assert_eq!(bg.pixel(5, 5)[3], 255);
    }

    #[test]
    fn selected_text_gets_a_box() {
        let text = TextObject {
            id: 3,
            text: "hi".to_string(),
            position: Point::new(10.0, 10.0),
            font: "Arial".to_string(),
            font_size: 10.0,
            color: "#0000ff".to_string(),
            rotation: 0.0,
            scale: 1.0,
        };
        let mut state = Command::add_text(text).apply(&EditorState::default());
        let mut l = layers(40, 30);
        let renderer = Renderer::new(200.0);
        renderer.render_state(&mut l, &state, LayerSet::all(), &Overrides::default());
        // box spans (10,10)-(22,20); its left edge is red
        assert_eq!(layer(&l, Layer::Texts).pixel(10, 15), [255, 0, 0, 255]);
        assert_eq!(layer(&l, Layer::Texts).pixel(13, 15), [0, 0, 255, 255]);

        state.selected.clear();
        renderer.render_state(&mut l, &state, LayerSet::only(Layer::Texts), &Overrides::default());
        assert_eq!(layer(&l, Layer::Texts).pixel(10, 15)[3], 0);
    }
}
