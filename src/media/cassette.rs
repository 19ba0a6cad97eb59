use eframe::egui::{pos2, Color32, ColorImage, Pos2, Rect};

use super::shade::{darken, lighten, sample_square, with_alpha};

/// Height over width of a compact cassette shell (63.8 mm by 100.4 mm).
pub const CASSETTE_ASPECT: f32 = 0.636;

const WINDOW_TINT: Color32 = Color32::from_rgb(28, 28, 32);
const REEL_COLOR: Color32 = Color32::from_rgb(236, 236, 240);
const SCREW_COLOR: Color32 = Color32::from_rgb(70, 70, 76);

#[derive(Debug, Clone)]
pub struct CassetteOptions {
    pub cassette_color: Color32,
    pub cassette_opacity: f32,
    pub output_width: usize,
}

pub fn cassette_size(output_width: usize) -> [usize; 2] {
    let height = (output_width as f32 * CASSETTE_ASPECT).round().max(1.0) as usize;
    [output_width, height]
}

/// Renders the front of a cassette: a shell in the given color and opacity,
/// a paper label carrying `artwork`, and the reel window.
///
/// Geometry is laid out in units of the shell width so the shape holds at any
/// output size.
pub fn render_cassette(artwork: &ColorImage, options: &CassetteOptions) -> ColorImage {
    let [width, height] = cassette_size(options.output_width);
    let mut output = ColorImage::new([width, height], vec![Color32::TRANSPARENT; width * height]);

    let [r, g, b, _] = options.cassette_color.to_srgba_unmultiplied();
    let shell_color = Color32::from_rgb(r, g, b);
    let opacity = options.cassette_opacity.clamp(0.0, 1.0);

    let bottom = CASSETTE_ASPECT;
    let shell = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, bottom));
    let label = Rect::from_min_max(pos2(0.06, 0.05), pos2(0.94, bottom * 0.66));
    let window = Rect::from_min_max(pos2(0.29, 0.17), pos2(0.71, 0.31));
    let head_block = Rect::from_min_max(pos2(0.18, bottom * 0.76), pos2(0.82, bottom));
    let reels = [pos2(0.375, 0.24), pos2(0.625, 0.24)];
    let reel_radius = 0.045;
    let hub_radius = 0.016;
    let guide_holes = [pos2(0.3, bottom * 0.89), pos2(0.7, bottom * 0.89)];
    let screws = [
        pos2(0.035, 0.035),
        pos2(0.965, 0.035),
        pos2(0.035, bottom - 0.035),
        pos2(0.965, bottom - 0.035),
        pos2(0.5, bottom - 0.03),
    ];

    for y in 0..height {
        for x in 0..width {
            let p = pos2(
                (x as f32 + 0.5) / width as f32,
                (y as f32 + 0.5) / width as f32,
            );

            if !in_rounded_rect(p, shell, 0.04)
                || guide_holes.iter().any(|hole| hole.distance(p) < 0.02)
            {
                continue;
            }

            let (color, alpha) = if screws.iter().any(|screw| screw.distance(p) < 0.012) {
                (SCREW_COLOR, 1.0)
            } else if reels.iter().any(|reel| reel.distance(p) < hub_radius) {
                (darken(REEL_COLOR, 0.55), 1.0)
            } else if reels.iter().any(|reel| reel.distance(p) < reel_radius) {
                (REEL_COLOR, 1.0)
            } else if in_rounded_rect(p, window, 0.02) {
                (WINDOW_TINT, 0.75)
            } else if in_rounded_rect(p, label, 0.015) {
                (label_pixel(artwork, label, p), 1.0)
            } else if head_block.contains(p) {
                (darken(shell_color, 0.15), opacity)
            } else {
                // Slight top-down gradient on the plastic.
                (lighten(shell_color, (1.0 - p.y / bottom) * 0.08), opacity)
            };

            output.pixels[y * width + x] = with_alpha(color, alpha);
        }
    }

    output
}

/// Maps the label onto the centre band of the square artwork, keeping the
/// artwork's aspect ratio.
fn label_pixel(artwork: &ColorImage, label: Rect, p: Pos2) -> Color32 {
    let u = (p.x - label.min.x) / label.width();
    let v = 0.5 + (p.y - label.center().y) / label.width();
    sample_square(artwork, u, v)
}

fn in_rounded_rect(p: Pos2, rect: Rect, radius: f32) -> bool {
    if !rect.contains(p) {
        return false;
    }
    let inner = rect.shrink(radius);
    inner.clamp(p).distance(p) <= radius
}
