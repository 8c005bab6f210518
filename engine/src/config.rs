use serde::{Serialize, Deserialize};
use crate::error::EditorResult;
use crate::types::{DrawSettings, FilterValues, ScaleValues, WriteSettings};

/// What happens to an in-flight gesture when the pointer leaves the canvas.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum PointerOutPolicy {
    /// Commit it as if the pointer had been released.
    #[default]
    Finalize,
    /// Drop it.
    Cancel,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct EditorConfig {
    /// Share of the container width the canvas may occupy.
    pub fix_css_width: f64,
    pub commit_delay_ms: f64,
    pub wheel_delay_ms: f64,
    pub zoom_step: f64,
    pub min_zoom: f64,
    /// `None` picks a preset from the canvas width.
    pub wrap_width: Option<f64>,
    pub pointer_out: PointerOutPolicy,
    pub default_text: String,
    pub filters: FilterValues,
    pub scales: ScaleValues,
    pub draw: DrawSettings,
    pub write: WriteSettings,
    pub log_level: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            fix_css_width: 1.0,
            commit_delay_ms: 500.0,
            wheel_delay_ms: 200.0,
            zoom_step: 0.1,
            min_zoom: 0.1,
            wrap_width: None,
            pointer_out: PointerOutPolicy::Finalize,
            default_text: "New Text...".to_string(),
            filters: FilterValues::default(),
            scales: ScaleValues::default(),
            draw: DrawSettings::default(),
            write: WriteSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> EditorResult<Self> {
        if json.trim().is_empty() {
            return Ok(EditorConfig::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = EditorConfig::from_json(r#"{"commit_delay_ms": 250, "pointer_out": "cancel", "draw": {"tool": "arrow"}}"#).unwrap();
        assert_eq!(cfg.commit_delay_ms, 250.0);
        assert_eq!(cfg.pointer_out, PointerOutPolicy::Cancel);
        assert_eq!(cfg.draw.tool, crate::types::Tool::Arrow);
        assert_eq!(cfg.draw.color, "#000000");
        assert_eq!(cfg.wheel_delay_ms, 200.0);
        assert_eq!(cfg.default_text, "New Text...");
        assert_eq!(EditorConfig::from_json("").unwrap(), EditorConfig::default());
    }

    #[test]
    fn bad_json_is_a_config_error() {
        assert!(matches!(EditorConfig::from_json("{nope"), Err(EditorError::Config(_))));
    }

    #[test]
    fn log_level_parses() {
        let cfg = EditorConfig { log_level: "debug".to_string(), ..EditorConfig::default() };
        assert_eq!(cfg.level_filter(), log::LevelFilter::Debug);
        let bad = EditorConfig { log_level: "loud".to_string(), ..EditorConfig::default() };
        assert_eq!(bad.level_filter(), log::LevelFilter::Info);
    }
}
