use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};
use serde::Deserialize;
use serde_json::json;
use kurbo::{Point, Size};
use crate::canvas::CanvasSurface;
use crate::config::EditorConfig;
use crate::engine::Editor;
use crate::error::EditorError;
use crate::geometry::{CanvasLayout, ClientRect};
use crate::logger;
use crate::render::Layers;
use crate::types::{DrawSettings, FilterPatch, Mode, ScalePatch, Tool, WriteSettings};

fn now_ms() -> f64 {
    js_sys::Date::now()
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from(EditorError::Js(e.to_string())))
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from(EditorError::Js(e.to_string())))
}

fn css_size_properties(layout: CanvasLayout) -> [(&'static str, String); 2] {
    [
        ("width", format!("{}px", layout.css_size.width)),
        ("height", format!("{}px", layout.css_size.height)),
    ]
}

/// JS entry point. Owns the four layer canvases (bottom to top: background,
/// drawings, texts, interactions); pointer events are read against the top one.
#[wasm_bindgen]
pub struct ImageEditor {
    editor: Editor<CanvasSurface>,
}

impl ImageEditor {
    fn client_rect(&self) -> ClientRect {
        match &self.editor.layers().interactions {
            Some(surface) => {
                let r = surface.element().get_bounding_client_rect();
                ClientRect::new(r.left(), r.top(), r.width(), r.height())
            }
            None => ClientRect::unscaled(self.editor.layout().pixel_size),
        }
    }

    fn apply_css_size(&self, layout: CanvasLayout) {
        let layers = self.editor.layers();
        let surfaces = [&layers.background, &layers.drawings, &layers.texts, &layers.interactions];
        for surface in surfaces.into_iter().flatten() {
            let style = surface.element().style();
            for (name, value) in css_size_properties(layout) {
                if let Err(e) = style.set_property(name, &value) {
                    log::debug!("canvas style {} failed: {:?}", name, e);
                }
            }
        }
    }

    fn client_point(event: &MouseEvent) -> Point {
        Point::new(event.client_x() as f64, event.client_y() as f64)
    }
}

#[wasm_bindgen]
impl ImageEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(
        background: HtmlCanvasElement,
        drawings: HtmlCanvasElement,
        texts: HtmlCanvasElement,
        interactions: HtmlCanvasElement,
        config_json: &str,
    ) -> Result<ImageEditor, JsValue> {
        let config = EditorConfig::from_json(config_json)?;
        logger::init(config.level_filter());
        let container = match interactions.parent_element() {
            Some(parent) => Size::new(parent.client_width() as f64, parent.client_height() as f64),
            None => Size::new(interactions.width() as f64, interactions.height() as f64),
        };
        let layers = Layers::new(
            CanvasSurface::new(background)?,
            CanvasSurface::new(drawings)?,
            CanvasSurface::new(texts)?,
            CanvasSurface::new(interactions)?,
        );
        let editor = Editor::new(layers, config, container);
        let this = ImageEditor { editor };
        this.apply_css_size(this.editor.layout());
        Ok(this)
    }

    pub fn on_pointer_down(&mut self, event: &MouseEvent) {
        let rect = self.client_rect();
        self.editor.pointer_down(Self::client_point(event), &rect);
    }

    pub fn on_pointer_move(&mut self, event: &MouseEvent) {
        let rect = self.client_rect();
        self.editor.pointer_move(Self::client_point(event), &rect);
    }

    pub fn on_pointer_up(&mut self) {
        self.editor.pointer_up();
    }

    pub fn on_pointer_out(&mut self) {
        self.editor.pointer_out();
    }

    pub fn on_pointer_enter(&mut self) {
        self.editor.pointer_enter();
    }

    pub fn on_click(&mut self, event: &MouseEvent) {
        let rect = self.client_rect();
        self.editor.click(Self::client_point(event), &rect);
    }

    pub fn on_double_click(&mut self, event: &MouseEvent) {
        let rect = self.client_rect();
        self.editor.double_click(Self::client_point(event), &rect);
    }

    pub fn on_wheel(&mut self, event: &WheelEvent) {
        if self.editor.captures_wheel() {
            event.prevent_default();
        }
        self.editor.wheel(event.delta_y(), now_ms());
    }

    pub fn on_key_down(&mut self, event: &KeyboardEvent) {
        let ctrl = event.ctrl_key() || event.meta_key();
        if self.editor.key_down(&event.key(), ctrl) {
            event.prevent_default();
        }
    }

    /// True while the pointer is over the canvas in pan mode; the host locks page
    /// scrolling while this holds.
    pub fn captures_wheel(&self) -> bool {
        self.editor.captures_wheel()
    }

    pub fn is_pointer_inside(&self) -> bool {
        self.editor.is_pointer_inside()
    }

    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode: Mode = mode.parse().map_err(|e: String| JsValue::from(EditorError::Js(e)))?;
        self.editor.set_mode(mode);
        Ok(())
    }

    pub fn set_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        let tool: Tool = tool.parse().map_err(|e: String| JsValue::from(EditorError::Js(e)))?;
        let draw = DrawSettings { tool, ..self.editor.settings().draw.clone() };
        self.editor.set_draw_settings(draw);
        Ok(())
    }

    pub fn set_draw_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let draw: DrawSettings = from_js(settings)?;
        self.editor.set_draw_settings(draw);
        Ok(())
    }

    pub fn set_write_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let write: WriteSettings = from_js(settings)?;
        self.editor.set_write_settings(write);
        Ok(())
    }

    pub fn get_settings(&self) -> Result<JsValue, JsValue> {
        to_js(self.editor.settings())
    }

    pub fn set_filters(&mut self, patch: JsValue) -> Result<(), JsValue> {
        let patch: FilterPatch = from_js(patch)?;
        self.editor.set_filters(&patch, now_ms());
        Ok(())
    }

    pub fn set_scales(&mut self, patch: JsValue) -> Result<(), JsValue> {
        let patch: ScalePatch = from_js(patch)?;
        self.editor.set_scales(&patch, now_ms());
        Ok(())
    }

    pub fn get_filters(&self) -> Result<JsValue, JsValue> {
        to_js(&self.editor.filter_values())
    }

    pub fn get_scales(&self) -> Result<JsValue, JsValue> {
        to_js(&self.editor.scale_values())
    }

    pub fn zoom_in(&mut self) {
        self.editor.zoom_in(now_ms());
    }

    pub fn zoom_out(&mut self) {
        self.editor.zoom_out(now_ms());
    }

    pub fn reset_view(&mut self) {
        self.editor.reset_view();
    }

    pub fn can_reset_view(&self) -> bool {
        self.editor.can_reset_view()
    }

    /// Drive from `requestAnimationFrame` or a timer.
    pub fn tick(&mut self, now: f64) -> bool {
        self.editor.tick(now)
    }

    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    pub fn reset(&mut self) {
        self.editor.reset();
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    pub fn can_reset(&self) -> bool {
        self.editor.can_reset()
    }

    pub fn update_selected_text(&mut self) -> bool {
        self.editor.update_selected_text()
    }

    pub fn load_background(&mut self, bytes: &[u8]) -> Result<JsValue, JsValue> {
        self.editor.load_background(bytes)?;
        let layout = self.editor.layout();
        self.apply_css_size(layout);
        to_js(&layout)
    }

    pub fn resize(&mut self, container_width: f64, container_height: f64) -> Result<JsValue, JsValue> {
        let layout = self.editor.resize(Size::new(container_width, container_height));
        self.apply_css_size(layout);
        to_js(&layout)
    }

    pub fn generate_image(&mut self) -> Result<Option<Vec<u8>>, JsValue> {
        self.editor.flush();
        Ok(self.editor.generate_image()?)
    }

    pub fn generate_image_data_url(&mut self) -> Result<Option<String>, JsValue> {
        self.editor.flush();
        Ok(self.editor.generate_image_data_url()?)
    }

    pub fn get_objects_json(&self) -> String {
        self.editor.objects_json()
    }

    pub fn get_history(&self) -> js_sys::Array {
        self.editor.history().labels().into_iter().map(JsValue::from_str).collect()
    }

    pub fn execute_command(&mut self, cmd_json: &str) -> String {
        #[derive(Deserialize)]
        struct Command {
            action: String,
            #[serde(default)]
            params: serde_json::Value,
        }

        let cmd: Command = match serde_json::from_str(cmd_json) {
            Ok(c) => c,
            Err(e) => return json!({ "error": format!("Invalid JSON: {}", e) }).to_string(),
        };

        let result: Result<(), String> = match cmd.action.as_str() {
            "undo" => {
                self.editor.undo();
                Ok(())
            }
            "redo" => {
                self.editor.redo();
                Ok(())
            }
            "reset" => {
                self.editor.reset();
                Ok(())
            }
            "reset_view" => {
                self.editor.reset_view();
                Ok(())
            }
            "zoom_in" => {
                self.editor.zoom_in(now_ms());
                Ok(())
            }
            "zoom_out" => {
                self.editor.zoom_out(now_ms());
                Ok(())
            }
            "flush" => {
                self.editor.flush();
                Ok(())
            }
            "set_mode" => cmd.params["mode"]
                .as_str()
                .ok_or_else(|| "missing mode".to_string())
                .and_then(|m| m.parse::<Mode>())
                .map(|m| self.editor.set_mode(m)),
            "set_tool" => cmd.params["tool"]
                .as_str()
                .ok_or_else(|| "missing tool".to_string())
                .and_then(|t| t.parse::<Tool>())
                .map(|tool| {
                    let draw = DrawSettings { tool, ..self.editor.settings().draw.clone() };
                    self.editor.set_draw_settings(draw);
                }),
            "set_filters" => serde_json::from_value::<FilterPatch>(cmd.params)
                .map_err(|e| e.to_string())
                .map(|patch| self.editor.set_filters(&patch, now_ms())),
            "set_scales" => serde_json::from_value::<ScalePatch>(cmd.params)
                .map_err(|e| e.to_string())
                .map(|patch| self.editor.set_scales(&patch, now_ms())),
            "set_write_settings" => serde_json::from_value::<WriteSettings>(cmd.params)
                .map_err(|e| e.to_string())
                .map(|write| self.editor.set_write_settings(write)),
            "update_selected_text" => {
                self.editor.update_selected_text();
                Ok(())
            }
            other => Err(format!("Unknown action: {}", other)),
        };

        match result {
            Ok(()) => json!({ "success": true }).to_string(),
            Err(e) => json!({ "error": e }).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_size_follows_the_fitted_layout() {
        let layout = CanvasLayout::fit(Size::new(40.0, 20.0), Size::new(100.0, 100.0), 1.0);
        assert_eq!(
            css_size_properties(layout),
            [("width", "100px".to_string()), ("height", "50px".to_string())]
        );
    }
}
