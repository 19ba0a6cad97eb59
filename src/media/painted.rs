use std::{
    sync::{
        mpsc::{self, TryRecvError},
        Arc,
    },
    thread,
    time::Instant,
};

use eframe::egui::{self, Color32, ColorImage, TextureHandle, TextureOptions};
use url::Url;

use super::{
    artwork::{Artwork, ArtworkLoader},
    cache::{RenderCache, RenderKey},
    cassette::{render_cassette, CassetteOptions, CASSETTE_ASPECT},
    disc::{render_disc, DISC_SPIN_RADIANS},
    vinyl::{render_vinyl, Spin, VinylOptions, VINYL_RPM_RADIANS},
    MediaRenderer,
};
use crate::{config::RenderConfig, params::MediaType};

const MAX_PREVIEW_SIDE: f32 = 360.0;
const MIN_PREVIEW_SIDE: f32 = 160.0;
const TEXTURE_CACHE_CAPACITY: usize = 24;

/// Built-in renderer: media are rendered on the CPU into textures, cached, and
/// drawn with egui. Records and discs spin.
pub struct PaintedMedia {
    config: RenderConfig,
    artwork: ArtworkLoader,
    textures: RenderCache<TextureHandle>,
    renders: RenderWorker,
    vinyl_spin: Spin,
    disc_spin: Spin,
    last_frame: Option<Instant>,
}

impl PaintedMedia {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            artwork: ArtworkLoader::default(),
            textures: RenderCache::with_capacity(TEXTURE_CACHE_CAPACITY),
            renders: RenderWorker::default(),
            vinyl_spin: Spin::new(VINYL_RPM_RADIANS),
            disc_spin: Spin::new(DISC_SPIN_RADIANS),
            last_frame: None,
        }
    }

    pub fn artwork_error(&self) -> Option<&str> {
        self.artwork.last_error()
    }

    /// Texture for the given media. `None` while the artwork is loading or
    /// the media is being rendered on the worker.
    fn texture(
        &mut self,
        ctx: &egui::Context,
        media_type: MediaType,
        artwork_url: &Url,
        color: Color32,
        opacity: f32,
    ) -> Option<TextureHandle> {
        if let Some((key, image)) = self.renders.drain() {
            let texture =
                ctx.load_texture("physical_media.preview", image, TextureOptions::LINEAR);
            self.textures.insert(key, texture);
        }

        let artwork = self.artwork.artwork(ctx, artwork_url)?;
        let key = RenderKey::new(
            media_type,
            artwork.hash,
            color,
            opacity,
            self.config.texture_size(),
        );
        if let Some(texture) = self.textures.get(&key) {
            return Some(texture);
        }

        if self.renders.inflight_key != Some(key) {
            log::debug!("rendering {} for {artwork_url}", media_type.label());
            let config = self.config.clone();
            self.renders.request(ctx, key, move || {
                render_media(media_type, &artwork, &config, color, opacity)
            });
        }
        None
    }

    fn advance_spin(&mut self, ctx: &egui::Context, media_type: MediaType) -> f32 {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(0.0)
            .min(0.25);
        self.last_frame = Some(now);

        let spinning = self.config.spin;
        if spinning {
            ctx.request_repaint();
        }

        let spin = match media_type {
            MediaType::VinylRecord => &mut self.vinyl_spin,
            MediaType::CompactDisc => &mut self.disc_spin,
            MediaType::CompactCassette => return 0.0,
        };
        spin.advance(dt, spinning);
        spin.angle()
    }

    fn spinning_media(
        &mut self,
        ui: &mut egui::Ui,
        media_type: MediaType,
        artwork_url: &Url,
        color: Color32,
        opacity: f32,
        scale: f32,
    ) -> egui::Response {
        let side = preview_side(ui, scale);
        let size = egui::vec2(side, side);
        let Some(texture) = self.texture(ui.ctx(), media_type, artwork_url, color, opacity) else {
            // New artwork starts from a resting position.
            self.vinyl_spin.reset();
            self.disc_spin.reset();
            self.last_frame = None;
            return loading(ui, size);
        };

        let angle = self.advance_spin(ui.ctx(), media_type);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::hover());
        paint_rotated(ui, rect, &texture, angle);
        response
    }
}

impl MediaRenderer for PaintedMedia {
    fn vinyl_record(
        &mut self,
        ui: &mut egui::Ui,
        artwork_url: &Url,
        vinyl_color: Color32,
        vinyl_opacity: f32,
        scale: f32,
    ) -> egui::Response {
        self.spinning_media(
            ui,
            MediaType::VinylRecord,
            artwork_url,
            vinyl_color,
            vinyl_opacity,
            scale,
        )
    }

    fn compact_disc(
        &mut self,
        ui: &mut egui::Ui,
        artwork_url: &Url,
        scale: f32,
    ) -> egui::Response {
        self.spinning_media(
            ui,
            MediaType::CompactDisc,
            artwork_url,
            Color32::WHITE,
            1.0,
            scale,
        )
    }

    fn compact_cassette(
        &mut self,
        ui: &mut egui::Ui,
        artwork_url: &Url,
        cassette_color: Color32,
        cassette_opacity: f32,
        scale: f32,
    ) -> egui::Response {
        let side = preview_side(ui, scale);
        let size = egui::vec2(side, side * CASSETTE_ASPECT);
        let texture = self.texture(
            ui.ctx(),
            MediaType::CompactCassette,
            artwork_url,
            cassette_color,
            cassette_opacity,
        );
        self.last_frame = None;

        match texture {
            Some(texture) => ui.add(egui::Image::new((texture.id(), size)).fit_to_exact_size(size)),
            None => loading(ui, size),
        }
    }
}

struct RenderedMessage {
    request_id: u64,
    key: RenderKey,
    image: ColorImage,
}

/// Runs media renders off the UI thread. Only the latest request is kept;
/// older results are dropped by request id.
#[derive(Default)]
struct RenderWorker {
    rx: Option<mpsc::Receiver<RenderedMessage>>,
    inflight_request: Option<u64>,
    inflight_key: Option<RenderKey>,
    next_request_id: u64,
}

impl RenderWorker {
    fn request<F>(&mut self, ctx: &egui::Context, key: RenderKey, render: F)
    where
        F: FnOnce() -> ColorImage + Send + 'static,
    {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        self.inflight_request = Some(request_id);
        self.inflight_key = Some(key);

        let ctx = ctx.clone();
        thread::spawn(move || {
            let image = render();
            let _ = tx.send(RenderedMessage {
                request_id,
                key,
                image,
            });
            ctx.request_repaint();
        });
    }

    fn drain(&mut self) -> Option<(RenderKey, ColorImage)> {
        let mut finished = false;
        let mut rendered = None;
        if let Some(rx) = self.rx.as_ref() {
            loop {
                match rx.try_recv() {
                    Ok(msg) => {
                        if Some(msg.request_id) != self.inflight_request {
                            continue;
                        }
                        rendered = Some((msg.key, msg.image));
                        finished = true;
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        finished = true;
                        break;
                    }
                }
            }
        }

        if finished {
            self.rx = None;
            self.inflight_request = None;
            self.inflight_key = None;
        }
        rendered
    }
}

fn render_media(
    media_type: MediaType,
    artwork: &Arc<Artwork>,
    config: &RenderConfig,
    color: Color32,
    opacity: f32,
) -> ColorImage {
    match media_type {
        MediaType::VinylRecord => render_vinyl(
            &artwork.image,
            &VinylOptions::from_config(config, color, opacity),
        ),
        MediaType::CompactDisc => render_disc(&artwork.image, config.texture_size()),
        MediaType::CompactCassette => render_cassette(
            &artwork.image,
            &CassetteOptions {
                cassette_color: color,
                cassette_opacity: opacity,
                output_width: config.texture_size(),
            },
        ),
    }
}

/// On-screen side length for `scale` within the space left in `ui`.
fn preview_side(ui: &egui::Ui, scale: f32) -> f32 {
    let available = ui.available_size();
    let max_side = available
        .x
        .min(available.y.max(MIN_PREVIEW_SIDE))
        .min(MAX_PREVIEW_SIDE)
        .max(0.0);
    (max_side * scale.clamp(0.0, 1.0)).floor()
}

fn loading(ui: &mut egui::Ui, size: egui::Vec2) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::hover());
    let spinner_size = size.min_elem().clamp(8.0, 32.0);
    ui.put(
        egui::Rect::from_center_size(rect.center(), egui::Vec2::splat(spinner_size)),
        egui::Spinner::new().size(spinner_size),
    );
    response.on_hover_text("Loading artwork")
}

fn paint_rotated(ui: &egui::Ui, rect: egui::Rect, texture: &TextureHandle, angle: f32) {
    let half = rect.size() * 0.5;
    let center = rect.center();
    let cos_r = angle.cos();
    let sin_r = angle.sin();

    let offsets = [
        egui::Vec2::new(-half.x, -half.y),
        egui::Vec2::new(half.x, -half.y),
        egui::Vec2::new(half.x, half.y),
        egui::Vec2::new(-half.x, half.y),
    ];
    let uvs = [
        egui::Pos2::new(0.0, 0.0),
        egui::Pos2::new(1.0, 0.0),
        egui::Pos2::new(1.0, 1.0),
        egui::Pos2::new(0.0, 1.0),
    ];

    let mut mesh = egui::Mesh::with_texture(texture.id());
    for (offset, uv) in offsets.into_iter().zip(uvs) {
        let rotated = egui::Vec2::new(
            offset.x * cos_r - offset.y * sin_r,
            offset.x * sin_r + offset.y * cos_r,
        );
        mesh.vertices.push(egui::epaint::Vertex {
            pos: center + rotated,
            uv,
            color: Color32::WHITE,
        });
    }
    mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
    ui.painter_at(rect).add(egui::Shape::mesh(mesh));
}
