use std::io::Cursor;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use crate::error::{EditorError, EditorResult};
use crate::objects::BackgroundImage;
use crate::types::{CompositeMode, FilterValues};

pub type Rgba = [u8; 4];

pub fn decode_background(id: u32, bytes: &[u8]) -> EditorResult<BackgroundImage> {
    let img = image::load_from_memory(bytes).map_err(EditorError::ImageDecode)?;
    Ok(BackgroundImage::new(id, img.to_rgba8()))
}

pub fn encode_png(img: &RgbaImage) -> EditorResult<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(EditorError::ImageEncode)?;
    Ok(bytes)
}

/// Value for `CanvasRenderingContext2D.filter`.
pub fn filter_css_string(f: &FilterValues) -> String {
    format!(
        "brightness({}%) contrast({}%) grayscale({}%) saturate({}%)",
        f.brightness, f.contrast, f.grayscale, f.saturate
    )
}

/// CSS filter chain on one unpremultiplied pixel, in the same order as
/// `filter_css_string`. Each stage clamps to [0, 1] like the browser does between
/// filter primitives.
pub fn filter_pixel(px: Rgba, f: &FilterValues) -> Rgba {
    let mut c = [px[0] as f64 / 255.0, px[1] as f64 / 255.0, px[2] as f64 / 255.0];

    let b = (f.brightness / 100.0).max(0.0);
    for v in c.iter_mut() {
        *v = (*v * b).clamp(0.0, 1.0);
    }

    let k = (f.contrast / 100.0).max(0.0);
    for v in c.iter_mut() {
        *v = ((*v - 0.5) * k + 0.5).clamp(0.0, 1.0);
    }

    let g = 1.0 - (f.grayscale / 100.0).clamp(0.0, 1.0);
    c = apply_matrix(c, [
        [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
    ]);

    let s = (f.saturate / 100.0).max(0.0);
    c = apply_matrix(c, [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]);

    [to_byte(c[0]), to_byte(c[1]), to_byte(c[2]), px[3]]
}

fn apply_matrix(c: [f64; 3], m: [[f64; 3]; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (row, o) in m.iter().zip(out.iter_mut()) {
        *o = (row[0] * c[0] + row[1] * c[1] + row[2] * c[2]).clamp(0.0, 1.0);
    }
    out
}

fn to_byte(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

pub fn apply_filter(img: &RgbaImage, f: &FilterValues) -> RgbaImage {
    if f.is_neutral() {
        return img.clone();
    }
    let mut out = img.clone();
    for p in out.pixels_mut() {
        p.0 = filter_pixel(p.0, f);
    }
    out
}

/// Any CSS color string (hex, `rgb()`/`hsl()` in either syntax, named colors) to RGBA.
pub fn parse_color(s: &str) -> Option<Rgba> {
    csscolorparser::parse(s.trim()).ok().map(|c| c.to_rgba8())
}

/// Invalid colors paint black, like a canvas keeping its default style.
pub fn color_or_black(s: &str) -> Rgba {
    parse_color(s).unwrap_or_else(|| {
        log::debug!("invalid color {:?}, painting black", s);
        [0, 0, 0, 255]
    })
}

/// Blends `src` scaled by `coverage` into `dst` (both unpremultiplied).
pub fn blend(dst: Rgba, src: Rgba, coverage: f64, mode: CompositeMode) -> Rgba {
    let sa = src[3] as f64 / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f64 / 255.0;
    match mode {
        CompositeMode::SourceOver => {
            let out_a = sa + da * (1.0 - sa);
            if out_a <= 0.0 {
                return [0, 0, 0, 0];
            }
            let mix = |s: u8, d: u8| {
                ((s as f64 * sa + d as f64 * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8
            };
            [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), to_byte(out_a)]
        }
        CompositeMode::DestinationOut => {
            let out_a = da * (1.0 - sa);
            if out_a <= 0.0 {
                return [0, 0, 0, 0];
            }
            [dst[0], dst[1], dst[2], to_byte(out_a)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_filter_string_order() {
        let f = FilterValues { brightness: 120.0, contrast: 80.0, saturate: 150.0, grayscale: 10.0 };
        assert_eq!(filter_css_string(&f), "brightness(120%) contrast(80%) grayscale(10%) saturate(150%)");
    }

    #[test]
    fn neutral_filter_keeps_pixels() {
        let f = FilterValues::default();
        for px in [[0, 0, 0, 255], [255, 0, 0, 255], [12, 200, 77, 128]] {
            let out = filter_pixel(px, &f);
            for i in 0..4 {
                assert!((out[i] as i32 - px[i] as i32).abs() <= 1, "{:?} -> {:?}", px, out);
            }
        }
    }

    #[test]
    fn filters_change_pixels() {
        let dark = filter_pixel([200, 100, 50, 255], &FilterValues { brightness: 50.0, ..FilterValues::default() });
        assert_eq!(dark, [100, 50, 25, 255]);

        let gray = filter_pixel([255, 0, 0, 255], &FilterValues { grayscale: 100.0, ..FilterValues::default() });
        assert_eq!(gray[0], gray[1]);
        assert_eq!(gray[1], gray[2]);

        let flat = filter_pixel([255, 0, 0, 255], &FilterValues { contrast: 0.0, ..FilterValues::default() });
        for c in &flat[..3] {
            assert!((*c as i32 - 128).abs() <= 1, "{:?}", flat);
        }
    }

    #[test]
    fn parses_css_colors() {
        assert_eq!(parse_color("#f00"), Some([255, 0, 0, 255]));
        assert_eq!(parse_color("#0000ff80"), Some([0, 0, 255, 128]));
        assert_eq!(parse_color("rgba(10, 20, 30, 0.5)"), Some([10, 20, 30, 128]));
        assert_eq!(parse_color("White"), Some([255, 255, 255, 255]));
        assert_eq!(parse_color("#zzz"), None);
        assert_eq!(color_or_black("nope"), [0, 0, 0, 255]);
    }

    #[test]
    fn parses_every_css_color_syntax() {
        assert_eq!(parse_color("cyan"), Some([0, 255, 255, 255]));
        assert_eq!(parse_color("magenta"), Some([255, 0, 255, 255]));
        assert_eq!(parse_color("rgb(255 0 0)"), Some([255, 0, 0, 255]));
        assert_eq!(parse_color("hsl(120, 100%, 50%)"), Some([0, 255, 0, 255]));
        assert_eq!(color_or_black("rebeccapurple"), [102, 51, 153, 255]);
    }

    #[test]
    fn blend_modes() {
        let red = [255, 0, 0, 255];
        let blue = [0, 0, 255, 255];
        assert_eq!(blend(red, blue, 1.0, CompositeMode::SourceOver), blue);
        assert_eq!(blend(red, blue, 1.0, CompositeMode::DestinationOut)[3], 0);
        assert_eq!(blend([0, 0, 0, 0], blue, 1.0, CompositeMode::SourceOver), blue);
        let half = blend(red, blue, 0.5, CompositeMode::DestinationOut);
        assert_eq!(half, [255, 0, 0, 128]);
    }

    #[test]
    fn decode_failure_is_an_error() {
        assert!(matches!(decode_background(1, b"not an image"), Err(EditorError::ImageDecode(_))));
    }

    #[test]
    fn png_round_trip_keeps_pixels() {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(1, 1, image::Rgba([1, 2, 3, 4]));
        let bytes = encode_png(&img).unwrap();
        let back = decode_background(5, &bytes).unwrap();
        assert_eq!(back.pixels.get_pixel(1, 1).0, [1, 2, 3, 4]);
        assert_eq!((back.width(), back.height()), (3, 2));
    }
}
