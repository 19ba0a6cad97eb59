use std::f32::consts::TAU;

use eframe::egui::{Color32, ColorImage};

use super::shade::{darken, edge_alpha, lerp_color, lighten, polar, sample_square, with_alpha};

/// A compact disc turns slower on screen than a record so the print stays
/// readable.
pub const DISC_SPIN_RADIANS: f32 = 1.2;

const HOLE_RATIO: f32 = 15.0 / 120.0;
const HUB_RATIO: f32 = 23.0 / 120.0;
const STACKING_RING_RATIO: f32 = 26.0 / 120.0;
const RIM_RATIO: f32 = 0.985;

const HUB_COLOR: Color32 = Color32::from_rgb(226, 230, 236);
const RIM_COLOR: Color32 = Color32::from_rgb(196, 200, 208);

/// Renders a disc with `artwork` printed across the data area.
pub fn render_disc(artwork: &ColorImage, output_size: usize) -> ColorImage {
    let size = output_size;
    let mut output = ColorImage::new([size, size], vec![Color32::TRANSPARENT; size * size]);

    for y in 0..size {
        for x in 0..size {
            let (radius, angle) = polar(x, y, size);
            if radius >= 1.0 || radius <= HOLE_RATIO {
                continue;
            }

            let (color, alpha) = if radius <= HUB_RATIO {
                // Clear polycarbonate hub.
                (HUB_COLOR, 0.35)
            } else if radius <= STACKING_RING_RATIO {
                (darken(HUB_COLOR, 0.18), 0.8)
            } else if radius >= RIM_RATIO {
                (RIM_COLOR, 1.0)
            } else {
                let u = 0.5 + 0.5 * radius * angle.cos();
                let v = 0.5 + 0.5 * radius * angle.sin();
                let printed = sample_square(artwork, u, v);
                (lerp_color(printed, iridescence(angle, radius), 0.12), 1.0)
            };

            let color = if radius > STACKING_RING_RATIO {
                let sheen = (angle * 2.0).cos().max(0.0).powf(6.0) * 0.18;
                lighten(color, sheen)
            } else {
                color
            };

            output.pixels[y * size + x] = with_alpha(color, alpha * edge_alpha(radius, 0.005));
        }
    }

    output
}

/// Rainbow diffraction tint that shifts with angle and radius.
fn iridescence(angle: f32, radius: f32) -> Color32 {
    let phase = angle * 2.0 + radius * 6.0;
    let channel = |offset: f32| (((phase - offset).cos() * 0.5 + 0.5) * 255.0).round() as u8;
    Color32::from_rgb(channel(0.0), channel(TAU / 3.0), channel(2.0 * TAU / 3.0))
}
