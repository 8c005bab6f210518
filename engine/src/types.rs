use serde::{Serialize, Deserialize};
use kurbo::Point;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Line,
    Circle,
    Arrow,
    Eraser,
}

impl Tool {
    /// Freehand tools keep every sampled point; shape tools keep `[start, end]`.
    pub fn is_freehand(self) -> bool {
        matches!(self, Tool::Pen | Tool::Eraser)
    }

    pub fn min_points(self) -> usize {
        if self.is_freehand() { 1 } else { 2 }
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pen" => Ok(Tool::Pen),
            "line" => Ok(Tool::Line),
            "circle" => Ok(Tool::Circle),
            "arrow" => Ok(Tool::Arrow),
            "eraser" => Ok(Tool::Eraser),
            other => Err(format!("unknown tool: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Draw,
    Pan,
    Write,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draw" => Ok(Mode::Draw),
            "pan" => Ok(Mode::Pan),
            "write" => Ok(Mode::Write),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// CSS-style filter percentages. 100 is neutral for everything but grayscale.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
#[serde(default)]
pub struct FilterValues {
    pub brightness: f64,
    pub contrast: f64,
    pub saturate: f64,
    pub grayscale: f64,
}

impl Default for FilterValues {
    fn default() -> Self {
        FilterValues { brightness: 100.0, contrast: 100.0, saturate: 100.0, grayscale: 0.0 }
    }
}

impl FilterValues {
    pub fn is_neutral(&self) -> bool {
        *self == FilterValues::default()
    }

    pub fn merged(&self, patch: &FilterPatch) -> FilterValues {
        FilterValues {
            brightness: patch.brightness.unwrap_or(self.brightness),
            contrast: patch.contrast.unwrap_or(self.contrast),
            saturate: patch.saturate.unwrap_or(self.saturate),
            grayscale: patch.grayscale.unwrap_or(self.grayscale),
        }
    }
}

/// Partial update coming from the host's sliders.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
#[serde(default)]
pub struct FilterPatch {
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub saturate: Option<f64>,
    pub grayscale: Option<f64>,
}

/// View transform settings: flips, zoom multiplier, rotation in degrees and pan offset
/// in canvas pixels.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
#[serde(default)]
pub struct ScaleValues {
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub zoom: f64,
    pub rotate: f64,
    pub offset: Point,
}

impl Default for ScaleValues {
    fn default() -> Self {
        ScaleValues {
            flip_horizontal: false,
            flip_vertical: false,
            zoom: 1.0,
            rotate: 0.0,
            offset: Point::ZERO,
        }
    }
}

impl ScaleValues {
    pub fn merged(&self, patch: &ScalePatch) -> ScaleValues {
        ScaleValues {
            flip_horizontal: patch.flip_horizontal.unwrap_or(self.flip_horizontal),
            flip_vertical: patch.flip_vertical.unwrap_or(self.flip_vertical),
            zoom: patch.zoom.unwrap_or(self.zoom),
            rotate: patch.rotate.unwrap_or(self.rotate),
            offset: patch.offset.unwrap_or(self.offset),
        }
    }

    /// True when zoom or pan differ from the identity view.
    pub fn is_panned(&self) -> bool {
        self.zoom != 1.0 || self.offset != Point::ZERO
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
#[serde(default)]
pub struct ScalePatch {
    pub flip_horizontal: Option<bool>,
    pub flip_vertical: Option<bool>,
    pub zoom: Option<f64>,
    pub rotate: Option<f64>,
    pub offset: Option<Point>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Background,
    Drawings,
    Texts,
    Interactions,
}

/// Set of layers touched by a command. `all()` also covers the shared view transform.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct LayerSet {
    pub background: bool,
    pub drawings: bool,
    pub texts: bool,
}

impl LayerSet {
    pub const NONE: LayerSet = LayerSet { background: false, drawings: false, texts: false };

    pub fn all() -> Self {
        LayerSet { background: true, drawings: true, texts: true }
    }

    pub fn only(layer: Layer) -> Self {
        let mut set = LayerSet::NONE;
        match layer {
            Layer::Background => set.background = true,
            Layer::Drawings => set.drawings = true,
            Layer::Texts => set.texts = true,
            Layer::Interactions => {}
        }
        set
    }

    pub fn is_all(&self) -> bool {
        self.background && self.drawings && self.texts
    }

    pub fn union(self, other: LayerSet) -> LayerSet {
        LayerSet {
            background: self.background || other.background,
            drawings: self.drawings || other.drawings,
            texts: self.texts || other.texts,
        }
    }

    pub fn contains(&self, layer: Layer) -> bool {
        match layer {
            Layer::Background => self.background,
            Layer::Drawings => self.drawings,
            Layer::Texts => self.texts,
            Layer::Interactions => false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CompositeMode {
    #[default]
    SourceOver,
    DestinationOut,
}

impl CompositeMode {
    pub fn as_css(self) -> &'static str {
        match self {
            CompositeMode::SourceOver => "source-over",
            CompositeMode::DestinationOut => "destination-out",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct DrawSettings {
    pub tool: Tool,
    pub color: String,
    pub brush_size: f64,
}

impl Default for DrawSettings {
    fn default() -> Self {
        DrawSettings { tool: Tool::Pen, color: "#000000".to_string(), brush_size: 4.0 }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct WriteSettings {
    pub text: String,
    pub font: String,
    /// Pixels.
    pub font_size: f64,
    pub color: String,
    pub rotation: f64,
    pub scale: f64,
}

impl Default for WriteSettings {
    fn default() -> Self {
        WriteSettings {
            text: String::new(),
            font: "Arial".to_string(),
            font_size: crate::presets::pt_to_px(12.0),
            color: "#000000".to_string(),
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

/// Snapshot of the host's tool state handed to the dispatcher on every event.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default)]
pub struct ToolSettings {
    pub mode: Mode,
    pub draw: DrawSettings,
    pub write: WriteSettings,
}
