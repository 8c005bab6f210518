use kurbo::{Point, Size, Vec2};
use crate::commands::Command;
use crate::config::PointerOutPolicy;
use crate::geometry::pan_delta;
use crate::objects::{DrawingObject, EditorState, IdGen, ObjectId, TextObject};
use crate::selection::{selection_after_click, text_at};
use crate::text::TextMeasure;
use crate::types::{Mode, ScaleValues, Tool, ToolSettings};

/// A pointer position in both spaces the dispatcher needs: logical canvas
/// coordinates for drawing and backing-store pixels for panning.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PointerPos {
    pub canvas: Point,
    pub pixel: Point,
}

/// Everything the dispatcher reads from the editor for one event.
pub struct DispatchContext<'a> {
    pub settings: &'a ToolSettings,
    pub state: &'a EditorState,
    pub view: ScaleValues,
    pub canvas_size: Size,
    pub measure: &'a dyn TextMeasure,
    pub wrap_width: f64,
    pub default_text: &'a str,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Gesture {
    Idle,
    Drawing(DrawingObject),
    Panning { start_pixel: Point, start: ScaleValues, current: ScaleValues },
    DraggingText { original: TextObject, grab: Vec2, current: TextObject },
}

#[derive(Clone, PartialEq, Debug)]
pub enum Outcome {
    None,
    /// Repaint the live layer with this shape.
    Preview(DrawingObject),
    /// Repaint the texts layer with this text in place of its committed version.
    TextPreview(TextObject),
    /// Repaint every layer with this view, without committing it.
    View(ScaleValues),
    Commit(Command),
    /// A pan drag ended; commit this view as a new scale object.
    CommitView(ScaleValues),
    /// The gesture ended without a command; drop any preview.
    Discard,
    Select(Vec<ObjectId>),
    /// Wheel delta to feed the zoom debouncer.
    Wheel(f64),
    Undo,
    Redo,
}

pub struct ToolDispatcher {
    gesture: Gesture,
    inside: bool,
    pointer_out: PointerOutPolicy,
}

impl ToolDispatcher {
    pub fn new(pointer_out: PointerOutPolicy) -> Self {
        ToolDispatcher { gesture: Gesture::Idle, inside: false, pointer_out }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Whether the host should keep wheel events from scrolling the page.
    pub fn captures_wheel(&self, mode: Mode) -> bool {
        self.inside && mode == Mode::Pan
    }

    pub fn set_pointer_out(&mut self, policy: PointerOutPolicy) {
        self.pointer_out = policy;
    }

    /// Drops the in-flight gesture, e.g. when the mode changes under it.
    pub fn cancel(&mut self) -> Outcome {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => Outcome::None,
            _ => Outcome::Discard,
        }
    }

    pub fn pointer_enter(&mut self) {
        self.inside = true;
    }

    pub fn pointer_down(&mut self, pos: PointerPos, ctx: &DispatchContext, ids: &mut IdGen) -> Outcome {
        self.inside = true;
        match ctx.settings.mode {
            Mode::Draw => {
                let draw = &ctx.settings.draw;
                let drawing = DrawingObject {
                    id: ids.allocate(),
                    tool: draw.tool,
                    points: vec![pos.canvas],
                    color: draw.color.clone(),
                    brush_size: draw.brush_size,
                    erase: draw.tool == Tool::Eraser,
                };
                self.gesture = Gesture::Drawing(drawing.clone());
                Outcome::Preview(drawing)
            }
            Mode::Pan => {
                self.gesture = Gesture::Panning { start_pixel: pos.pixel, start: ctx.view, current: ctx.view };
                Outcome::None
            }
            Mode::Write => {
                let hit = text_at(ctx.state, pos.canvas, ctx.measure, ctx.wrap_width);
                match hit {
                    Some(text) if ctx.state.is_selected(text.id) => {
                        self.gesture = Gesture::DraggingText {
                            original: text.clone(),
                            grab: pos.canvas - text.position,
                            current: text.clone(),
                        };
                        Outcome::None
                    }
                    _ => Outcome::None,
                }
            }
        }
    }

    pub fn pointer_move(&mut self, pos: PointerPos, ctx: &DispatchContext) -> Outcome {
        if !self.inside {
            return Outcome::None;
        }
        match &mut self.gesture {
            Gesture::Idle => Outcome::None,
            Gesture::Drawing(drawing) => {
                if drawing.tool.is_freehand() {
                    drawing.points.push(pos.canvas);
                } else {
                    let start = drawing.points[0];
                    drawing.points = vec![start, pos.canvas];
                }
                Outcome::Preview(drawing.clone())
            }
            Gesture::Panning { start_pixel, start, current } => {
                let delta = pan_delta(pos.pixel - *start_pixel, start, ctx.canvas_size);
                current.offset = start.offset + delta;
                Outcome::View(*current)
            }
            Gesture::DraggingText { grab, current, .. } => {
                current.position = pos.canvas - *grab;
                Outcome::TextPreview(current.clone())
            }
        }
    }

    pub fn pointer_up(&mut self) -> Outcome {
        self.finish(false)
    }

    /// Ends any gesture according to the pointer-out policy and marks the pointer as
    /// outside, which releases the host's scroll lock.
    pub fn pointer_out(&mut self) -> Outcome {
        self.inside = false;
        let cancel = self.pointer_out == PointerOutPolicy::Cancel;
        self.finish(cancel)
    }

    pub fn click(&mut self, pos: PointerPos, ctx: &DispatchContext) -> Outcome {
        if ctx.settings.mode != Mode::Write || self.is_active() {
            return Outcome::None;
        }
        let hit = text_at(ctx.state, pos.canvas, ctx.measure, ctx.wrap_width);
        Outcome::Select(selection_after_click(hit))
    }

    pub fn double_click(&mut self, pos: PointerPos, ctx: &DispatchContext, ids: &mut IdGen) -> Outcome {
        if ctx.settings.mode != Mode::Write || self.is_active() {
            return Outcome::None;
        }
        let write = &ctx.settings.write;
        let text = TextObject {
            id: ids.allocate(),
            text: ctx.default_text.to_string(),
            position: pos.canvas,
            font: write.font.clone(),
            font_size: write.font_size,
            color: write.color.clone(),
            rotation: write.rotation,
            scale: write.scale,
        };
        Outcome::Commit(Command::add_text(text))
    }

    pub fn wheel(&mut self, delta_y: f64, mode: Mode) -> Outcome {
        if !self.captures_wheel(mode) || delta_y == 0.0 {
            return Outcome::None;
        }
        Outcome::Wheel(delta_y)
    }

    pub fn key_down(&mut self, key: &str, ctrl: bool) -> Outcome {
        if !self.inside || !ctrl {
            return Outcome::None;
        }
        match key.to_ascii_lowercase().as_str() {
            "z" => Outcome::Undo,
            "y" => Outcome::Redo,
            _ => Outcome::None,
        }
    }

    fn finish(&mut self, cancel: bool) -> Outcome {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        if cancel {
            return match gesture {
                Gesture::Idle => Outcome::None,
                _ => Outcome::Discard,
            };
        }
        match gesture {
            Gesture::Idle => Outcome::None,
            Gesture::Drawing(drawing) => {
                if drawing.has_enough_points() {
                    Outcome::Commit(Command::add_drawing(drawing))
                } else {
                    log::debug!("{:?} gesture dropped with {} point(s)", drawing.tool, drawing.points.len());
                    Outcome::Discard
                }
            }
            Gesture::Panning { start, current, .. } => {
                if current == start {
                    Outcome::Discard
                } else {
                    Outcome::CommitView(current)
                }
            }
            Gesture::DraggingText { original, current, .. } => {
                if original == current {
                    Outcome::Discard
                } else {
                    Outcome::Commit(Command::update_text(original, current))
                }
            }
        }
    }
}

/// Next wheel zoom target: one step from the current target rounded to two
/// decimals, never below `min_zoom`.
pub fn wheel_zoom(current: f64, delta_y: f64, step: f64, min_zoom: f64) -> f64 {
    let base = (current * 100.0).round() / 100.0;
    let next = if delta_y < 0.0 { base + step } else { base - step };
    ((next * 100.0).round() / 100.0).max(min_zoom)
}
