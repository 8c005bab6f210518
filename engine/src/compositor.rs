use base64::{Engine as _, engine::general_purpose};
use image::{imageops, RgbaImage};
use crate::error::EditorResult;
use crate::image_ops::encode_png;
use crate::render::Layers;
use crate::surface::Surface;
use crate::types::Layer;

const EXPORT_ORDER: [Layer; 3] = [Layer::Background, Layer::Drawings, Layer::Texts];

/// Flattens background, drawings and texts (in that order) onto a transparent image.
/// `None` when any of the three layers is missing or unreadable. The live layer is
/// never exported.
pub fn composite_layers<S: Surface>(layers: &Layers<S>, width: u32, height: u32) -> Option<RgbaImage> {
    let mut snapshots = Vec::with_capacity(EXPORT_ORDER.len());
    for layer in EXPORT_ORDER {
        let snapshot = layers.get(layer).and_then(|s| s.snapshot());
        match snapshot {
            Some(img) => snapshots.push(img),
            None => {
                log::debug!("export skipped: {:?} layer unavailable", layer);
                return None;
            }
        }
    }
    let mut out = RgbaImage::new(width, height);
    for img in &snapshots {
        imageops::overlay(&mut out, img, 0, 0);
    }
    Some(out)
}

pub fn generate_image<S: Surface>(layers: &Layers<S>, width: u32, height: u32) -> EditorResult<Option<Vec<u8>>> {
    match composite_layers(layers, width, height) {
        Some(img) => encode_png(&img).map(Some),
        None => Ok(None),
    }
}

pub fn generate_image_data_url<S: Surface>(layers: &Layers<S>, width: u32, height: u32) -> EditorResult<Option<String>> {
    Ok(generate_image(layers, width, height)?
        .map(|png| format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png))))
}
