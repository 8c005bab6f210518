use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    ImageEncode(#[source] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Canvas context unavailable: {0}")]
    ContextUnavailable(&'static str),

    #[error("JavaScript error: {0}")]
    Js(String),
}

pub type EditorResult<T> = Result<T, EditorError>;

impl From<JsValue> for EditorError {
    fn from(value: JsValue) -> Self {
        EditorError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<EditorError> for JsValue {
    fn from(err: EditorError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
