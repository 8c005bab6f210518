use kurbo::{Point, Rect, Vec2};
use crate::objects::TextObject;

/// Width of a single line of text in pixels.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f64, font: &str) -> f64;
}

/// Fixed-advance measurement used when no browser font engine is available.
#[derive(Clone, Copy, Debug)]
pub struct MonospaceMeasure {
    pub advance: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        MonospaceMeasure { advance: 0.6 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, font_size: f64, _font: &str) -> f64 {
        text.chars().count() as f64 * font_size * self.advance
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextMetrics {
    pub lines: Vec<String>,
    pub width: f64,
    pub height: f64,
    pub line_height: f64,
}

impl TextMetrics {
    /// Box in the text's local frame.
    pub fn local_box(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Greedy word wrap on spaces. A word only starts a new line when the current one is
/// non-empty, so a single long word is never split.
pub fn wrap_lines(measure: &dyn TextMeasure, text: &str, font_size: f64, font: &str, wrap_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split(' ') {
        let candidate = if line.is_empty() { word.to_string() } else { format!("{} {}", line, word) };
        if !line.is_empty() && measure.measure(&candidate, font_size, font) > wrap_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    lines.push(line);
    lines
}

pub fn text_metrics(measure: &dyn TextMeasure, text: &TextObject, wrap_width: f64) -> TextMetrics {
    let lines = wrap_lines(measure, &text.text, text.font_size, &text.font, wrap_width);
    let line_height = text.font_size;
    let width = lines
        .iter()
        .map(|l| measure.measure(l, text.font_size, &text.font))
        .fold(0.0, f64::max);
    let height = line_height * lines.len() as f64;
    TextMetrics { lines, width, height, line_height }
}

/// Maps a canvas point into the text's own frame (undoing its position, rotation and scale).
pub fn to_local(point: Point, text: &TextObject) -> Point {
    let d: Vec2 = point - text.position;
    let angle = -text.rotation.to_radians();
    let (sin, cos) = angle.sin_cos();
    let rx = d.x * cos - d.y * sin;
    let ry = d.x * sin + d.y * cos;
    let scale = if text.scale != 0.0 { text.scale } else { 1.0 };
    Point::new(rx / scale, ry / scale)
}

pub fn hit_test(measure: &dyn TextMeasure, point: Point, text: &TextObject, wrap_width: f64) -> bool {
    let metrics = text_metrics(measure, text, wrap_width);
    let local = to_local(point, text);
    local.x >= 0.0 && local.x <= metrics.width && local.y >= 0.0 && local.y <= metrics.height
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(text: &str) -> TextObject {
        TextObject {
            id: 1,
            text: text.to_string(),
            position: Point::new(100.0, 100.0),
            font: "Arial".to_string(),
            font_size: 10.0,
            color: "#000000".to_string(),
            rotation: 0.0,
            scale: 1.0,
        }
    }

    #[test]
    fn wraps_at_width() {
        let m = MonospaceMeasure::default();
        // 6px per char at size 10
        let lines = wrap_lines(&m, "aaaa bbbb cccc", 10.0, "Arial", 60.0);
        assert_eq!(lines, vec!["aaaa bbbb".to_string(), "cccc".to_string()]);
        let long = wrap_lines(&m, "abcdefghijklmnop", 10.0, "Arial", 30.0);
        assert_eq!(long.len(), 1);
    }

    #[test]
    fn metrics_box_spans_lines() {
        let m = MonospaceMeasure::default();
        let metrics = text_metrics(&m, &sample("aaaa bbbb cccc"), 60.0);
        assert_eq!(metrics.lines.len(), 2);
        assert!((metrics.width - 54.0).abs() < 1e-9);
        assert!((metrics.height - 20.0).abs() < 1e-9);
    }

    #[test]
    fn hit_test_honors_rotation_and_scale() {
        let m = MonospaceMeasure::default();
        let mut t = sample("hello");
        // box is 30 x 10 in local space
        assert!(hit_test(&m, Point::new(110.0, 105.0), &t, 200.0));
        assert!(!hit_test(&m, Point::new(95.0, 105.0), &t, 200.0));

        t.rotation = 90.0;
        // local +x now points down the canvas
        assert!(hit_test(&m, Point::new(95.0, 120.0), &t, 200.0));
        assert!(!hit_test(&m, Point::new(120.0, 105.0), &t, 200.0));

        t.rotation = 0.0;
        t.scale = 2.0;
        assert!(hit_test(&m, Point::new(155.0, 115.0), &t, 200.0));
    }
}
