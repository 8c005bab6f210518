pub mod types;
pub mod presets;
pub mod geometry;
pub mod text;
pub mod objects;
pub mod commands;
pub mod history;
pub mod debounce;
pub mod error;
pub mod config;
pub mod logger;
pub mod image_ops;
pub mod surface;
pub mod raster;
pub mod canvas;
pub mod render;
pub mod compositor;
pub mod selection;
pub mod dispatcher;
pub mod engine;
pub mod web;

pub use engine::Editor;
pub use web::ImageEditor;
pub use config::EditorConfig;
pub use error::{EditorError, EditorResult};
pub use commands::Command;
pub use types::*;
pub use objects::*;
