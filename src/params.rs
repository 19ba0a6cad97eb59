use eframe::egui::Color32;
use serde::Deserialize;

pub const DEFAULT_ARTWORK_URL: &str = "https://f4.bcbits.com/img/a3629485078_10.jpg";
pub const DEFAULT_COLOR: Color32 = Color32::from_rgb(255, 45, 85);
pub const DEFAULT_OPACITY: f32 = 0.5;
pub const DEFAULT_SCALE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    VinylRecord,
    CompactDisc,
    CompactCassette,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [
        MediaType::VinylRecord,
        MediaType::CompactDisc,
        MediaType::CompactCassette,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MediaType::VinylRecord => "Vinyl Record",
            MediaType::CompactDisc => "Compact Disc",
            MediaType::CompactCassette => "Compact Cassette",
        }
    }

    /// Compact discs are always silver; only the other media take a color.
    pub fn supports_color(self) -> bool {
        !matches!(self, MediaType::CompactDisc)
    }
}

/// Snapshot of everything the form forwards to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParameters {
    pub artwork_url: String,
    pub color: Color32,
    pub opacity: f32,
    pub scale: f32,
    pub media_type: MediaType,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            artwork_url: DEFAULT_ARTWORK_URL.to_string(),
            color: DEFAULT_COLOR,
            opacity: DEFAULT_OPACITY,
            scale: DEFAULT_SCALE,
            media_type: MediaType::VinylRecord,
        }
    }
}

/// Clamps to `[0, 1]`. NaN yields `None` so callers can keep the old value.
pub fn unit_interval(value: f32) -> Option<f32> {
    if value.is_nan() {
        None
    } else {
        Some(value.clamp(0.0, 1.0))
    }
}
