//! The physical-media rendering capability and its built-in painter.

pub mod artwork;
pub mod cache;
pub mod cassette;
pub mod disc;
pub mod painted;
pub mod shade;
pub mod vinyl;

use eframe::egui::{self, Color32};
use url::Url;

use crate::params::{MediaType, RenderParameters};

pub use painted::PaintedMedia;

/// Presentation operations of a media renderer, one per media type.
///
/// Implementations may be slow to produce their first frame (artwork has to
/// be loaded); they are expected to show their own progress in the meantime.
pub trait MediaRenderer {
    fn vinyl_record(
        &mut self,
        ui: &mut egui::Ui,
        artwork_url: &Url,
        vinyl_color: Color32,
        vinyl_opacity: f32,
        scale: f32,
    ) -> egui::Response;

    fn compact_disc(&mut self, ui: &mut egui::Ui, artwork_url: &Url, scale: f32)
        -> egui::Response;

    fn compact_cassette(
        &mut self,
        ui: &mut egui::Ui,
        artwork_url: &Url,
        cassette_color: Color32,
        cassette_opacity: f32,
        scale: f32,
    ) -> egui::Response;
}

/// Forwards a preview to the renderer operation for `media_type`.
pub fn present<R: MediaRenderer + ?Sized>(
    renderer: &mut R,
    ui: &mut egui::Ui,
    media_type: MediaType,
    params: &RenderParameters,
    artwork_url: &Url,
) -> egui::Response {
    match media_type {
        MediaType::VinylRecord => renderer.vinyl_record(
            ui,
            artwork_url,
            params.color,
            params.opacity,
            params.scale,
        ),
        MediaType::CompactDisc => renderer.compact_disc(ui, artwork_url, params.scale),
        MediaType::CompactCassette => renderer.compact_cassette(
            ui,
            artwork_url,
            params.color,
            params.opacity,
            params.scale,
        ),
    }
}
