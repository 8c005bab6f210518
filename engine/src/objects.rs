use std::fmt;
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use kurbo::{Point, Size};
use image::RgbaImage;
use crate::types::{Tool, FilterValues, ScaleValues, CompositeMode, Layer};

pub type ObjectId = u32;

/// Session-wide id counter. Undo and reset never rewind it.
#[derive(Clone, Debug)]
pub struct IdGen {
    next: ObjectId,
}

impl Default for IdGen {
    fn default() -> Self {
        IdGen { next: 1 }
    }
}

impl IdGen {
    pub fn allocate(&mut self) -> ObjectId {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> ObjectId {
        self.next
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct DrawingObject {
    pub id: ObjectId,
    pub tool: Tool,
    /// Pen/eraser: polyline. Line/arrow: `[start, end]`. Circle: `[center, edge]`.
    pub points: Vec<Point>,
    pub color: String,
    pub brush_size: f64,
    pub erase: bool,
}

impl DrawingObject {
    pub fn composite(&self) -> CompositeMode {
        if self.erase { CompositeMode::DestinationOut } else { CompositeMode::SourceOver }
    }

    pub fn has_enough_points(&self) -> bool {
        self.points.len() >= self.tool.min_points()
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct TextObject {
    pub id: ObjectId,
    pub text: String,
    pub position: Point,
    pub font: String,
    /// Pixels; also the line height.
    pub font_size: f64,
    pub color: String,
    /// Degrees.
    pub rotation: f64,
    pub scale: f64,
}

impl TextObject {
    pub fn css_font(&self) -> String {
        format!("{}px {}", self.font_size, self.font)
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct FilterObject {
    pub id: ObjectId,
    pub values: FilterValues,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ScaleObject {
    pub id: ObjectId,
    pub values: ScaleValues,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CanvasObject {
    Drawing(DrawingObject),
    Text(TextObject),
    Filter(FilterObject),
    Scale(ScaleObject),
}

impl CanvasObject {
    pub fn id(&self) -> ObjectId {
        match self {
            CanvasObject::Drawing(o) => o.id,
            CanvasObject::Text(o) => o.id,
            CanvasObject::Filter(o) => o.id,
            CanvasObject::Scale(o) => o.id,
        }
    }

    /// Layer that has to be repainted when this object appears or disappears.
    /// `None` means every layer (the view transform changes).
    pub fn layer(&self) -> Option<Layer> {
        match self {
            CanvasObject::Drawing(_) => Some(Layer::Drawings),
            CanvasObject::Text(_) => Some(Layer::Texts),
            CanvasObject::Filter(_) => Some(Layer::Background),
            CanvasObject::Scale(_) => None,
        }
    }
}

/// Decoded background bitmap. Cloning shares the pixels.
#[derive(Clone)]
pub struct BackgroundImage {
    pub id: u32,
    pub pixels: Arc<RgbaImage>,
}

impl BackgroundImage {
    pub fn new(id: u32, pixels: RgbaImage) -> Self {
        BackgroundImage { id, pixels: Arc::new(pixels) }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn natural_size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }
}

impl PartialEq for BackgroundImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Immutable document snapshot. `objects` is in paint order.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct EditorState {
    pub background: Option<BackgroundImage>,
    pub objects: Vec<CanvasObject>,
    pub selected: Vec<ObjectId>,
    /// Values in effect before any filter object exists.
    pub base_filter: FilterValues,
    /// Values in effect before any scale object exists.
    pub base_scale: ScaleValues,
}

impl EditorState {
    /// Empty document whose filter and view start from the given values.
    pub fn with_base(base_filter: FilterValues, base_scale: ScaleValues) -> Self {
        EditorState { base_filter, base_scale, ..EditorState::default() }
    }

    pub fn drawings(&self) -> impl Iterator<Item = &DrawingObject> {
        self.objects.iter().filter_map(|o| match o {
            CanvasObject::Drawing(d) => Some(d),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextObject> {
        self.objects.iter().filter_map(|o| match o {
            CanvasObject::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn find_text(&self, id: ObjectId) -> Option<&TextObject> {
        self.texts().find(|t| t.id == id)
    }

    /// Last filter object wins.
    pub fn active_filter(&self) -> Option<&FilterObject> {
        self.objects.iter().rev().find_map(|o| match o {
            CanvasObject::Filter(f) => Some(f),
            _ => None,
        })
    }

    /// Last scale object wins.
    pub fn active_scale(&self) -> Option<&ScaleObject> {
        self.objects.iter().rev().find_map(|o| match o {
            CanvasObject::Scale(s) => Some(s),
            _ => None,
        })
    }

    pub fn filter_values(&self) -> FilterValues {
        self.active_filter().map_or(self.base_filter, |f| f.values)
    }

    pub fn scale_values(&self) -> ScaleValues {
        self.active_scale().map_or(self.base_scale, |s| s.values)
    }

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.background.is_none() && self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(id: ObjectId, brightness: f64) -> CanvasObject {
        CanvasObject::Filter(FilterObject { id, values: FilterValues { brightness, ..FilterValues::default() } })
    }

    #[test]
    fn last_filter_and_scale_are_active() {
        let mut state = EditorState::default();
        assert_eq!(state.filter_values(), FilterValues::default());
        assert_eq!(state.scale_values(), ScaleValues::default());

        state.objects.push(filter(1, 80.0));
        state.objects.push(CanvasObject::Scale(ScaleObject {
            id: 2,
            values: ScaleValues { zoom: 2.0, ..ScaleValues::default() },
        }));
        state.objects.push(filter(3, 120.0));

        assert_eq!(state.active_filter().map(|f| f.id), Some(3));
        assert_eq!(state.filter_values().brightness, 120.0);
        assert_eq!(state.scale_values().zoom, 2.0);
    }

    #[test]
    fn base_values_apply_until_an_object_overrides_them() {
        let base = FilterValues { brightness: 120.0, ..FilterValues::default() };
        let mut state = EditorState::with_base(base, ScaleValues { zoom: 0.5, ..ScaleValues::default() });
        assert!(state.is_empty());
        assert_eq!(state.filter_values(), base);
        assert_eq!(state.scale_values().zoom, 0.5);

        state.objects.push(filter(1, 90.0));
        assert_eq!(state.filter_values().brightness, 90.0);
        assert_eq!(state.scale_values().zoom, 0.5);
    }

    #[test]
    fn objects_serialize_with_type_tag() {
        let obj = filter(7, 90.0);
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["type"], "filter");
        assert_eq!(json["id"], 7);
        let back: CanvasObject = serde_json::from_value(json).unwrap();
        assert_eq!(back, obj);
    }
}
