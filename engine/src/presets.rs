// Ordered small to big.
pub const CANVAS_SM: u32 = 400;
pub const CANVAS_MD: u32 = 800;
pub const CANVAS_LG: u32 = 1280;
pub const CANVAS_XL: u32 = 2000;
pub const CANVAS_XXL: u32 = 3000;
pub const CANVAS_XXXL: u32 = 3400;

pub const WRAP_WIDTHS: [f64; 4] = [200.0, 300.0, 400.0, 500.0];
pub const FONT_SIZES_PT: [f64; 11] = [8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 24.0, 36.0, 48.0, 72.0, 144.0];
pub const BRUSH_SIZES_PT: [f64; 13] = [1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 15.0, 20.0, 25.0, 50.0, 75.0, 100.0, 125.0];

pub fn pt_to_px(pt: f64) -> f64 {
    pt * (96.0 / 72.0)
}

pub fn bigger_side(width: u32, height: u32) -> u32 {
    width.max(height)
}

/// Text wrap width that keeps annotations readable on large images.
pub fn best_wrap_width(canvas_width: Option<u32>) -> f64 {
    match canvas_width {
        Some(w) if w >= CANVAS_XXXL => WRAP_WIDTHS[3],
        Some(w) if w >= CANVAS_XXL => WRAP_WIDTHS[2],
        Some(w) if w >= CANVAS_XL => WRAP_WIDTHS[1],
        _ => WRAP_WIDTHS[0],
    }
}

/// Font size in points for an image whose bigger side is `bigger`.
pub fn best_font_size_pt(bigger: Option<u32>) -> f64 {
    let index = match bigger {
        Some(b) if b >= CANVAS_XXXL => 10,
        Some(b) if b >= CANVAS_XXL => 9,
        Some(b) if b >= CANVAS_XL => 8,
        Some(b) if b >= CANVAS_LG => 6,
        _ => 4,
    };
    FONT_SIZES_PT[index]
}

/// Brush size for an image whose bigger side is `bigger`.
pub fn best_brush_size_pt(bigger: Option<u32>) -> f64 {
    let index = match bigger {
        Some(b) if b >= CANVAS_XXXL => 8,
        Some(b) if b >= CANVAS_XXL => 7,
        Some(b) if b >= CANVAS_XL => 6,
        _ => 5,
    };
    BRUSH_SIZES_PT[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_grow_with_image() {
        assert_eq!(best_brush_size_pt(None), 10.0);
        assert_eq!(best_brush_size_pt(Some(CANVAS_MD)), 10.0);
        assert_eq!(best_brush_size_pt(Some(CANVAS_XL)), 15.0);
        assert_eq!(best_brush_size_pt(Some(4000)), 25.0);
        assert_eq!(best_font_size_pt(Some(CANVAS_SM)), 16.0);
        assert_eq!(best_font_size_pt(Some(CANVAS_LG)), 24.0);
        assert_eq!(best_font_size_pt(Some(CANVAS_XXXL)), 144.0);
        assert_eq!(best_wrap_width(Some(3100)), 400.0);
        assert_eq!(best_wrap_width(None), 200.0);
    }

    #[test]
    fn points_convert_to_css_pixels() {
        assert!((pt_to_px(72.0) - 96.0).abs() < 1e-9);
    }
}
