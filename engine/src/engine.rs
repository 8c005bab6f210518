use kurbo::{Point, Size};
use crate::commands::Command;
use crate::compositor;
use crate::config::EditorConfig;
use crate::debounce::Debouncer;
use crate::dispatcher::{wheel_zoom, DispatchContext, Outcome, PointerPos, ToolDispatcher};
use crate::error::EditorResult;
use crate::geometry::{client_to_pixels, view_transform, CanvasLayout, ClientRect};
use crate::history::History;
use crate::image_ops::decode_background;
use crate::objects::{EditorState, IdGen};
use crate::presets::{best_brush_size_pt, best_font_size_pt, best_wrap_width, bigger_side, pt_to_px};
use crate::render::{Layers, Overrides, Preview, Renderer};
use crate::selection::selected_text;
use crate::surface::Surface;
use crate::text::{MonospaceMeasure, TextMeasure};
use crate::types::{
    DrawSettings, FilterPatch, FilterValues, Layer, LayerSet, Mode, ScalePatch, ScaleValues, ToolSettings, WriteSettings,
};

/// The editor core: history, layers, input dispatch and debounced settings.
/// Time is supplied by the host (`now_ms` arguments and `tick`).
pub struct Editor<S: Surface> {
    config: EditorConfig,
    history: History,
    layers: Layers<S>,
    renderer: Renderer,
    dispatcher: ToolDispatcher,
    settings: ToolSettings,
    ids: IdGen,
    container: Size,
    layout: CanvasLayout,
    fallback_measure: MonospaceMeasure,
    // Pending-or-active slider values.
    filter_target: FilterValues,
    scale_target: ScaleValues,
    filter_commit: Debouncer<FilterValues>,
    scale_commit: Debouncer<ScaleValues>,
    wheel: Debouncer<f64>,
    // Pan drag in progress.
    view_override: Option<ScaleValues>,
    last_now_ms: f64,
}

impl<S: Surface> Editor<S> {
    pub fn new(layers: Layers<S>, config: EditorConfig, container: Size) -> Self {
        let initial = EditorState::with_base(config.filters, config.scales);
        let settings = ToolSettings { mode: Mode::Draw, draw: config.draw.clone(), write: config.write.clone() };

        let mut editor = Editor {
            history: History::new(initial),
            layers,
            renderer: Renderer::new(best_wrap_width(None)),
            dispatcher: ToolDispatcher::new(config.pointer_out),
            settings,
            ids: IdGen::default(),
            container,
            layout: CanvasLayout::free(container),
            fallback_measure: MonospaceMeasure::default(),
            filter_target: config.filters,
            scale_target: config.scales,
            filter_commit: Debouncer::new(config.commit_delay_ms),
            scale_commit: Debouncer::new(config.commit_delay_ms),
            wheel: Debouncer::new(config.wheel_delay_ms),
            view_override: None,
            last_now_ms: 0.0,
            config,
        };
        editor.relayout();
        editor.render(LayerSet::all());
        editor
    }

    pub fn state(&self) -> &EditorState {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn layers(&self) -> &Layers<S> {
        &self.layers
    }

    pub fn layout(&self) -> CanvasLayout {
        self.layout
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn wrap_width(&self) -> f64 {
        self.renderer.wrap_width
    }

    /// Filter values shown on screen: pending slider values or the committed ones.
    pub fn filter_values(&self) -> FilterValues {
        self.filter_target
    }

    /// View shown on screen: a pan drag, pending slider values or the committed ones.
    pub fn scale_values(&self) -> ScaleValues {
        self.view_override.unwrap_or(self.scale_target)
    }

    pub fn has_pending_commits(&self) -> bool {
        self.filter_commit.is_pending() || self.scale_commit.is_pending() || self.wheel.is_pending()
    }

    // ---- settings ----

    pub fn set_settings(&mut self, settings: ToolSettings) {
        if settings.mode != self.settings.mode {
            let outcome = self.dispatcher.cancel();
            self.settings = settings;
            self.handle(outcome);
        } else {
            self.settings = settings;
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        let settings = ToolSettings { mode, ..self.settings.clone() };
        self.set_settings(settings);
    }

    pub fn set_draw_settings(&mut self, draw: DrawSettings) {
        self.settings.draw = draw;
    }

    pub fn set_write_settings(&mut self, write: WriteSettings) {
        self.settings.write = write;
    }

    pub fn set_filters(&mut self, patch: &FilterPatch, now_ms: f64) {
        self.last_now_ms = now_ms;
        self.filter_target = self.filter_target.merged(patch);
        self.filter_commit.schedule(self.filter_target, now_ms);
        self.render(LayerSet::only(Layer::Background));
    }

    pub fn set_scales(&mut self, patch: &ScalePatch, now_ms: f64) {
        self.last_now_ms = now_ms;
        self.scale_target = self.scale_target.merged(patch);
        self.scale_commit.schedule(self.scale_target, now_ms);
        self.render(LayerSet::all());
    }

    pub fn zoom_in(&mut self, now_ms: f64) {
        let zoom = wheel_zoom(self.scale_target.zoom, -1.0, self.config.zoom_step, self.config.min_zoom);
        self.set_scales(&ScalePatch { zoom: Some(zoom), ..ScalePatch::default() }, now_ms);
    }

    pub fn zoom_out(&mut self, now_ms: f64) {
        let zoom = wheel_zoom(self.scale_target.zoom, 1.0, self.config.zoom_step, self.config.min_zoom);
        self.set_scales(&ScalePatch { zoom: Some(zoom), ..ScalePatch::default() }, now_ms);
    }

    pub fn can_reset_view(&self) -> bool {
        self.scale_values().is_panned()
    }

    /// Back to zoom 1 and no pan, keeping rotation and flips. Commits immediately.
    pub fn reset_view(&mut self) {
        self.scale_commit.cancel();
        self.wheel.cancel();
        self.view_override = None;
        let target = ScaleValues { zoom: 1.0, offset: Point::ZERO, ..self.scale_target };
        self.scale_target = target;
        if !self.commit_scale(target) {
            self.render(LayerSet::all());
        }
    }

    /// Fires debounced work whose deadline has passed. Returns true when anything
    /// was committed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.last_now_ms = now_ms;
        if let Some(delta_y) = self.wheel.poll(now_ms) {
            let zoom = wheel_zoom(self.scale_target.zoom, delta_y, self.config.zoom_step, self.config.min_zoom);
            self.set_scales(&ScalePatch { zoom: Some(zoom), ..ScalePatch::default() }, now_ms);
        }
        let mut committed = false;
        if let Some(filters) = self.filter_commit.poll(now_ms) {
            committed |= self.commit_filter(filters);
        }
        if let Some(scales) = self.scale_commit.poll(now_ms) {
            committed |= self.commit_scale(scales);
        }
        committed
    }

    /// Commits pending slider values now, e.g. before an export.
    pub fn flush(&mut self) -> bool {
        let mut committed = false;
        if let Some(filters) = self.filter_commit.flush() {
            committed |= self.commit_filter(filters);
        }
        if let Some(scales) = self.scale_commit.flush() {
            committed |= self.commit_scale(scales);
        }
        committed
    }

    fn commit_filter(&mut self, values: FilterValues) -> bool {
        if values == self.state().filter_values() {
            log::debug!("filter commit skipped: unchanged");
            return false;
        }
        let id = self.ids.allocate();
        self.dispatch(Command::update_filters(id, values));
        true
    }

    fn commit_scale(&mut self, values: ScaleValues) -> bool {
        if values == self.state().scale_values() {
            log::debug!("scale commit skipped: unchanged");
            return false;
        }
        let id = self.ids.allocate();
        self.dispatch(Command::update_scales(id, values));
        true
    }

    // ---- history ----

    pub fn dispatch(&mut self, cmd: Command) {
        let dirty = cmd.affected_layers();
        let background = self.background_id();
        self.history.dispatch(cmd);
        self.after_history_change(dirty, background, false);
    }

    pub fn undo(&mut self) -> bool {
        let background = self.background_id();
        let dirty = match self.history.undo() {
            Some(cmd) => cmd.affected_layers(),
            None => return false,
        };
        self.after_history_change(dirty, background, true);
        true
    }

    pub fn redo(&mut self) -> bool {
        let background = self.background_id();
        let dirty = match self.history.redo() {
            Some(cmd) => cmd.affected_layers(),
            None => return false,
        };
        self.after_history_change(dirty, background, true);
        true
    }

    pub fn reset(&mut self) {
        let background = self.background_id();
        self.history.reset();
        log::info!("editor reset");
        self.after_history_change(LayerSet::all(), background, true);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn can_reset(&self) -> bool {
        self.history.can_reset()
    }

    fn background_id(&self) -> Option<u32> {
        self.state().background.as_ref().map(|b| b.id)
    }

    fn after_history_change(&mut self, dirty: LayerSet, background_before: Option<u32>, drop_pending: bool) {
        if drop_pending {
            self.filter_commit.cancel();
            self.scale_commit.cancel();
            self.wheel.cancel();
        }
        if !self.filter_commit.is_pending() {
            self.filter_target = self.state().filter_values();
        }
        if !self.scale_commit.is_pending() {
            self.scale_target = self.state().scale_values();
        }
        // Selection may have moved with the history step.
        let mut dirty = dirty.union(LayerSet::only(Layer::Texts));
        if self.background_id() != background_before {
            self.relayout();
            dirty = LayerSet::all();
        }
        self.renderer.clear_preview(&mut self.layers);
        self.render(dirty);
    }

    // ---- background & layout ----

    pub fn load_background(&mut self, bytes: &[u8]) -> EditorResult<()> {
        let image = match decode_background(self.ids.peek(), bytes) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("background not loaded: {}", e);
                return Err(e);
            }
        };
        self.ids.allocate();
        log::info!("background loaded: {}x{}", image.width(), image.height());
        let bigger = Some(bigger_side(image.width(), image.height()));
        self.settings.draw.brush_size = best_brush_size_pt(bigger);
        self.settings.write.font_size = pt_to_px(best_font_size_pt(bigger));
        let before = self.state().background.clone();
        self.dispatch(Command::set_background(before, Some(image)));
        Ok(())
    }

    pub fn resize(&mut self, container: Size) -> CanvasLayout {
        self.container = container;
        self.relayout();
        self.render(LayerSet::all());
        self.layout
    }

    fn relayout(&mut self) {
        self.layout = match &self.state().background {
            Some(bg) => CanvasLayout::fit(bg.natural_size(), self.container, self.config.fix_css_width),
            None => CanvasLayout::free(self.container),
        };
        self.layers.resize(self.layout.pixel_width(), self.layout.pixel_height());
        self.renderer.wrap_width = self
            .config
            .wrap_width
            .unwrap_or_else(|| best_wrap_width(Some(self.layout.pixel_width())));
    }

    // ---- rendering & export ----

    fn render(&mut self, dirty: LayerSet) {
        let overrides = Overrides { scale: Some(self.scale_values()), filter: Some(self.filter_target) };
        self.renderer.render_state(&mut self.layers, self.history.current(), dirty, &overrides);
    }

    pub fn generate_image(&self) -> EditorResult<Option<Vec<u8>>> {
        compositor::generate_image(&self.layers, self.layout.pixel_width(), self.layout.pixel_height())
    }

    pub fn generate_image_data_url(&self) -> EditorResult<Option<String>> {
        compositor::generate_image_data_url(&self.layers, self.layout.pixel_width(), self.layout.pixel_height())
    }

    pub fn objects_json(&self) -> String {
        serde_json::to_string(&self.state().objects).unwrap_or_else(|_| "[]".to_string())
    }

    // ---- input ----

    pub fn pointer_position(&self, client: Point, rect: &ClientRect) -> PointerPos {
        let size = self.layout.pixel_size;
        let pixel = client_to_pixels(client, rect, size);
        let canvas = view_transform(&self.scale_values(), size).inverse() * pixel;
        PointerPos { canvas, pixel }
    }

    fn run_tool<R>(&mut self, f: impl FnOnce(&mut ToolDispatcher, &DispatchContext, &mut IdGen) -> R) -> R {
        let view = self.scale_values();
        let measure: &dyn TextMeasure = match &self.layers.texts {
            Some(surface) => surface,
            None => &self.fallback_measure,
        };
        let ctx = DispatchContext {
            settings: &self.settings,
            state: self.history.current(),
            view,
            canvas_size: self.layout.pixel_size,
            measure,
            wrap_width: self.renderer.wrap_width,
            default_text: &self.config.default_text,
        };
        f(&mut self.dispatcher, &ctx, &mut self.ids)
    }

    pub fn pointer_down(&mut self, client: Point, rect: &ClientRect) {
        let pos = self.pointer_position(client, rect);
        let outcome = self.run_tool(|d, ctx, ids| d.pointer_down(pos, ctx, ids));
        self.handle(outcome);
    }

    pub fn pointer_move(&mut self, client: Point, rect: &ClientRect) {
        let pos = self.pointer_position(client, rect);
        let outcome = self.run_tool(|d, ctx, _| d.pointer_move(pos, ctx));
        self.handle(outcome);
    }

    pub fn pointer_up(&mut self) {
        let outcome = self.dispatcher.pointer_up();
        self.handle(outcome);
    }

    pub fn pointer_out(&mut self) {
        let outcome = self.dispatcher.pointer_out();
        self.handle(outcome);
    }

    pub fn pointer_enter(&mut self) {
        self.dispatcher.pointer_enter();
    }

    pub fn is_pointer_inside(&self) -> bool {
        self.dispatcher.is_inside()
    }

    pub fn captures_wheel(&self) -> bool {
        self.dispatcher.captures_wheel(self.settings.mode)
    }

    pub fn click(&mut self, client: Point, rect: &ClientRect) {
        let pos = self.pointer_position(client, rect);
        let outcome = self.run_tool(|d, ctx, _| d.click(pos, ctx));
        self.handle(outcome);
    }

    pub fn double_click(&mut self, client: Point, rect: &ClientRect) {
        let pos = self.pointer_position(client, rect);
        let outcome = self.run_tool(|d, ctx, ids| d.double_click(pos, ctx, ids));
        self.handle(outcome);
    }

    pub fn wheel(&mut self, delta_y: f64, now_ms: f64) {
        self.last_now_ms = now_ms;
        let outcome = self.dispatcher.wheel(delta_y, self.settings.mode);
        self.handle(outcome);
    }

    /// Returns true when the key was consumed.
    pub fn key_down(&mut self, key: &str, ctrl: bool) -> bool {
        let outcome = self.dispatcher.key_down(key, ctrl);
        let consumed = outcome != Outcome::None;
        self.handle(outcome);
        consumed
    }

    /// Rewrites the selected text with the current write settings. An empty settings
    /// text keeps the existing content.
    pub fn update_selected_text(&mut self) -> bool {
        let Some(before) = selected_text(self.state()).cloned() else { return false };
        let write = &self.settings.write;
        let mut after = before.clone();
        if !write.text.is_empty() {
            after.text = write.text.clone();
        }
        after.font = write.font.clone();
        after.font_size = write.font_size;
        after.color = write.color.clone();
        after.rotation = write.rotation;
        after.scale = write.scale;
        if after == before {
            return false;
        }
        self.dispatch(Command::update_text(before, after));
        true
    }

    fn handle(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::None => {}
            Outcome::Preview(drawing) => {
                let preview = Preview { drawing: Some(&drawing), text: None };
                self.renderer.render_preview(&mut self.layers, self.history.current(), &preview);
            }
            Outcome::TextPreview(text) => {
                let preview = Preview { drawing: None, text: Some(&text) };
                self.renderer.render_preview(&mut self.layers, self.history.current(), &preview);
            }
            Outcome::View(view) => {
                self.view_override = Some(view);
                self.render(LayerSet::all());
            }
            Outcome::Commit(cmd) => {
                self.renderer.clear_preview(&mut self.layers);
                self.dispatch(cmd);
            }
            Outcome::CommitView(view) => {
                // The drag only owns the offset; zoom may have moved under it.
                self.view_override = None;
                self.scale_commit.cancel();
                let target = ScaleValues { offset: view.offset, ..self.scale_target };
                self.scale_target = target;
                if !self.commit_scale(target) {
                    self.render(LayerSet::all());
                }
            }
            Outcome::Discard => {
                self.renderer.clear_preview(&mut self.layers);
                let dirty = if self.view_override.take().is_some() {
                    LayerSet::all()
                } else {
                    LayerSet { background: false, drawings: true, texts: true }
                };
                self.render(dirty);
            }
            Outcome::Select(ids) => {
                self.history.select(ids);
                self.render(LayerSet::only(Layer::Texts));
            }
            Outcome::Wheel(delta_y) => self.wheel.schedule(delta_y, self.last_now_ms),
            Outcome::Undo => {
                self.undo();
            }
            Outcome::Redo => {
                self.redo();
            }
        }
    }
}
