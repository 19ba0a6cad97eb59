use std::f32::consts::TAU;

use eframe::egui::{Color32, ColorImage};

use super::shade::{darken, edge_alpha, lighten, polar, sample_square, with_alpha};
use crate::config::RenderConfig;

/// 33 1/3 RPM in radians per second.
pub const VINYL_RPM_RADIANS: f32 = 3.49;

#[derive(Debug, Clone)]
pub struct VinylOptions {
    pub vinyl_color: Color32,
    pub vinyl_opacity: f32,
    pub label_ratio: f32,
    pub output_size: usize,
    pub groove_count: usize,
}

impl VinylOptions {
    pub fn from_config(config: &RenderConfig, vinyl_color: Color32, vinyl_opacity: f32) -> Self {
        Self {
            vinyl_color,
            vinyl_opacity,
            label_ratio: config.label_ratio(),
            output_size: config.texture_size(),
            groove_count: config.groove_count,
        }
    }
}

/// Renders a translucent colored record with `artwork` on the centre label.
pub fn render_vinyl(artwork: &ColorImage, options: &VinylOptions) -> ColorImage {
    let size = options.output_size;
    let mut output = ColorImage::new([size, size], vec![Color32::TRANSPARENT; size * size]);

    let [r, g, b, _] = options.vinyl_color.to_srgba_unmultiplied();
    let base = Color32::from_rgb(r, g, b);
    let opacity = options.vinyl_opacity.clamp(0.0, 1.0);

    let label_ratio = options.label_ratio.clamp(0.1, 0.6);
    let groove_count = options.groove_count.max(6);
    let groove_half_width = 0.015;
    let groove_intensity = 0.14;
    let label_ring_width = 0.015;
    let label_ring_highlight = 0.18;
    let edge_shadow_start = 0.82;
    let outer_vignette = 0.28;
    let sheen_angle = -0.35..=0.25;
    let sheen_strength = 0.22;
    let hole_radius_px = (size as f32 / 100.0).clamp(3.5, 7.5);
    let hole_ratio = hole_radius_px / (size as f32 / 2.0);

    for y in 0..size {
        for x in 0..size {
            let (radius, angle) = polar(x, y, size);
            if radius >= 1.0 || radius <= hole_ratio {
                continue;
            }

            let (mut color, alpha) = if radius <= label_ratio {
                let t = radius / label_ratio;
                let u = 0.5 + 0.5 * t * angle.cos();
                let v = 0.5 + 0.5 * t * angle.sin();
                let center_bright = (label_ratio - radius) / label_ratio;
                (lighten(sample_square(artwork, u, v), center_bright * 0.08), 1.0)
            } else {
                let normalized = ((radius - label_ratio) / (1.0 - label_ratio)).clamp(0.0, 1.0);
                let mut color = base;

                let mut groove_shade = 0.0;
                for i in 1..=groove_count {
                    let ring_pos = i as f32 / (groove_count as f32 + 1.0);
                    let dist = (normalized - ring_pos).abs();
                    if dist < groove_half_width {
                        let t = 1.0 - (dist / groove_half_width);
                        groove_shade += t * t;
                    }
                }
                if groove_shade > 0.0 {
                    color = darken(color, groove_shade * groove_intensity);
                }

                if radius > edge_shadow_start {
                    let t = ((radius - edge_shadow_start) / (1.0 - edge_shadow_start)).clamp(0.0, 1.0);
                    color = darken(color, t * (0.25 + outer_vignette));
                }

                if sheen_angle.contains(&angle) && radius > label_ratio + 0.05 {
                    let angle_t =
                        (angle - sheen_angle.start()) / (sheen_angle.end() - sheen_angle.start());
                    let highlight = (1.0 - angle_t.clamp(0.0, 1.0)).powf(2.2);
                    color = lighten(color, highlight * sheen_strength);
                }

                (color, opacity)
            };

            let ring_delta = (radius - label_ratio).abs();
            if ring_delta < label_ring_width {
                let t = 1.0 - (ring_delta / label_ring_width);
                color = lighten(color, t * label_ring_highlight);
            }

            output.pixels[y * size + x] = with_alpha(color, alpha * edge_alpha(radius, 0.005));
        }
    }

    output
}

/// Rotation state for spinning media.
#[derive(Debug, Clone)]
pub struct Spin {
    angle: f32,
    speed: f32,
}

impl Spin {
    pub fn new(speed: f32) -> Self {
        Self { angle: 0.0, speed }
    }

    pub fn advance(&mut self, dt: f32, spinning: bool) {
        if spinning && dt > 0.0 {
            self.angle = (self.angle + self.speed * dt).rem_euclid(TAU);
        }
    }

    pub fn reset(&mut self) {
        self.angle = 0.0;
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}
