//! Pixel helpers shared by the media painters.

use eframe::egui::{Color32, ColorImage};

/// Normalized polar coordinates of a pixel centre in a square image of `size`
/// pixels: `(r, angle)` with `r = 1.0` at the inscribed circle.
pub fn polar(x: usize, y: usize, size: usize) -> (f32, f32) {
    let radius_px = size as f32 / 2.0;
    let dx = (x as f32 + 0.5 - radius_px) / radius_px;
    let dy = (y as f32 + 0.5 - radius_px) / radius_px;
    ((dx * dx + dy * dy).sqrt(), dy.atan2(dx))
}

/// Samples `image` at normalized `(u, v)` in `[0, 1]`, cropping to the centred
/// square so non-square artwork is not stretched.
pub fn sample_square(image: &ColorImage, u: f32, v: f32) -> Color32 {
    let width = image.size[0] as f32;
    let height = image.size[1] as f32;
    let side = width.min(height);
    let x = (width - side) / 2.0 + u.clamp(0.0, 1.0) * side - 0.5;
    let y = (height - side) / 2.0 + v.clamp(0.0, 1.0) * side - 0.5;
    sample_bilinear(image, x, y)
}

pub fn sample_bilinear(image: &ColorImage, x: f32, y: f32) -> Color32 {
    let width = image.size[0] as i32;
    let height = image.size[1] as i32;
    if width == 0 || height == 0 {
        return Color32::BLACK;
    }

    let clamped_x = x.clamp(0.0, (width - 1) as f32);
    let clamped_y = y.clamp(0.0, (height - 1) as f32);

    let x0 = clamped_x.floor() as i32;
    let y0 = clamped_y.floor() as i32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let tx = clamped_x - x0 as f32;
    let ty = clamped_y - y0 as f32;

    let at = |x: i32, y: i32| image.pixels[(y as usize) * image.size[0] + x as usize];

    let top = lerp_color(at(x0, y0), at(x1, y0), tx);
    let bottom = lerp_color(at(x0, y1), at(x1, y1), tx);
    lerp_color(top, bottom, ty)
}

pub fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t).round() as u8;
    Color32::from_rgba_unmultiplied(
        mix(a.r(), b.r()),
        mix(a.g(), b.g()),
        mix(a.b(), b.b()),
        mix(a.a(), b.a()),
    )
}

pub fn darken(color: Color32, amount: f32) -> Color32 {
    let keep = 1.0 - amount.clamp(0.0, 1.0);
    let channel = |c: u8| (c as f32 * keep).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgba_unmultiplied(
        channel(color.r()),
        channel(color.g()),
        channel(color.b()),
        color.a(),
    )
}

pub fn lighten(color: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let channel = |c: u8| {
        (c as f32 + (255.0 - c as f32) * amount)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Color32::from_rgba_unmultiplied(
        channel(color.r()),
        channel(color.g()),
        channel(color.b()),
        color.a(),
    )
}

/// Replaces the alpha channel, keeping the (unmultiplied) color.
pub fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Fades the outermost `feather` of a disc to transparent.
pub fn edge_alpha(r: f32, feather: f32) -> f32 {
    if r > 1.0 - feather {
        ((1.0 - r) / feather).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polar_centre_and_corner() {
        let (r, _) = polar(50, 50, 101);
        assert!(r < 0.02);
        let (r, _) = polar(0, 0, 100);
        assert!(r > 1.0);
    }

    #[test]
    fn darken_and_lighten_extremes() {
        let color = Color32::from_rgb(100, 150, 200);
        assert_eq!(darken(color, 1.0), Color32::from_rgb(0, 0, 0));
        assert_eq!(lighten(color, 1.0), Color32::from_rgb(255, 255, 255));
        assert_eq!(darken(color, 0.0), color);
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let faded = with_alpha(Color32::from_rgb(255, 45, 85), 0.5);
        let [r, g, b, a] = faded.to_srgba_unmultiplied();
        assert_eq!(a, 128);
        assert!(r >= 252 && (42..=48).contains(&g) && (82..=88).contains(&b));
    }

    #[test]
    fn sample_square_crops_wide_images() {
        let mut image = ColorImage::new([4, 2], vec![Color32::RED; 8]);
        image.pixels[1] = Color32::BLUE;
        image.pixels[2] = Color32::BLUE;
        image.pixels[5] = Color32::BLUE;
        image.pixels[6] = Color32::BLUE;
        assert_eq!(sample_square(&image, 0.25, 0.25), Color32::BLUE);
        assert_eq!(sample_square(&image, 0.75, 0.75), Color32::BLUE);
    }
}
