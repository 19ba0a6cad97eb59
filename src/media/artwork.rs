use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    fs,
    hash::{Hash, Hasher},
    sync::{
        mpsc::{self, TryRecvError},
        Arc,
    },
    thread,
};

use anyhow::{anyhow, Context as _};
use eframe::egui::{self, Color32, ColorImage};
use url::Url;

use super::shade::{darken, lerp_color};

const GENERATED_ARTWORK_SIZE: usize = 256;
const MAX_CACHED_ARTWORK: usize = 16;

#[derive(Debug)]
pub struct Artwork {
    pub image: ColorImage,
    /// Hash of the source bytes, or of the URL for generated artwork.
    pub hash: u64,
    pub generated: bool,
}

struct ArtworkMessage {
    request_id: u64,
    url: Url,
    artwork: Artwork,
    error: Option<String>,
}

/// Loads album artwork off the UI thread.
///
/// One request is in flight at a time; asking for a different URL abandons
/// the previous request and its late result is dropped by request id.
#[derive(Default)]
pub struct ArtworkLoader {
    loaded: HashMap<Url, Arc<Artwork>>,
    rx: Option<mpsc::Receiver<ArtworkMessage>>,
    inflight_request: Option<u64>,
    inflight_url: Option<Url>,
    next_request_id: u64,
    last_error: Option<String>,
}

impl ArtworkLoader {
    /// Returns the artwork for `url` if it is ready, otherwise starts loading
    /// it and returns `None`.
    pub fn artwork(&mut self, ctx: &egui::Context, url: &Url) -> Option<Arc<Artwork>> {
        self.drain();

        if let Some(artwork) = self.loaded.get(url) {
            return Some(artwork.clone());
        }

        if self.inflight_url.as_ref() != Some(url) {
            self.request(ctx, url.clone());
        }
        None
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn drain(&mut self) {
        let mut clear_rx = false;
        if let Some(rx) = self.rx.as_ref() {
            loop {
                match rx.try_recv() {
                    Ok(msg) => {
                        if Some(msg.request_id) != self.inflight_request {
                            continue;
                        }
                        self.inflight_request = None;
                        self.inflight_url = None;
                        clear_rx = true;

                        let ArtworkMessage {
                            request_id: _,
                            url,
                            artwork,
                            error,
                        } = msg;

                        if let Some(err) = &error {
                            log::warn!("artwork for {url}: {err}");
                        } else {
                            log::debug!(
                                "artwork for {url} ready ({}x{}{})",
                                artwork.image.size[0],
                                artwork.image.size[1],
                                if artwork.generated { ", generated" } else { "" }
                            );
                        }
                        self.last_error = error;

                        if self.loaded.len() >= MAX_CACHED_ARTWORK {
                            self.loaded.clear();
                        }
                        self.loaded.insert(url, Arc::new(artwork));
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.inflight_request = None;
                        self.inflight_url = None;
                        clear_rx = true;
                        break;
                    }
                }
            }
        }

        if clear_rx {
            self.rx = None;
        }
    }

    fn request(&mut self, ctx: &egui::Context, url: Url) {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        self.inflight_request = Some(request_id);
        self.inflight_url = Some(url.clone());
        log::debug!("requesting artwork {url} (request {request_id})");

        let ctx = ctx.clone();
        thread::spawn(move || {
            let (artwork, error) = match fetch_artwork_bytes(&url) {
                Ok(Some(bytes)) => match decode_artwork_image(&bytes) {
                    Ok(image) => (
                        Artwork {
                            image,
                            hash: hash_bytes(&bytes),
                            generated: false,
                        },
                        None,
                    ),
                    Err(err) => (generated_artwork(&url), Some(err)),
                },
                Ok(None) => (generated_artwork(&url), None),
                Err(err) => (generated_artwork(&url), Some(format!("{err:#}"))),
            };

            let _ = tx.send(ArtworkMessage {
                request_id,
                url,
                artwork,
                error,
            });
            ctx.request_repaint();
        });
    }
}

/// Reads local artwork. Remote schemes are not fetched and yield `None`.
pub fn fetch_artwork_bytes(url: &Url) -> anyhow::Result<Option<Vec<u8>>> {
    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| anyhow!("Not a local file path: {url}"))?;
            let bytes = fs::read(&path)
                .with_context(|| format!("Failed to read artwork: {}", path.display()))?;
            Ok(Some(bytes))
        }
        _ => Ok(None),
    }
}

pub fn decode_artwork_image(bytes: &[u8]) -> std::result::Result<ColorImage, String> {
    let image =
        image::load_from_memory(bytes).map_err(|e| format!("Failed to decode artwork: {e}"))?;
    let image = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    let pixels = image.into_raw();
    Ok(ColorImage::from_rgba_unmultiplied(size, &pixels))
}

/// Stand-in cover for artwork that cannot be loaded: a diagonal two-tone
/// gradient with concentric bands, derived from the URL so each link keeps
/// its own look.
pub fn generated_artwork(url: &Url) -> Artwork {
    let hash = hash_bytes(url.as_str().as_bytes());
    let channel = |shift: u32| ((hash >> shift) & 0xFF) as u8;
    let start = Color32::from_rgb(channel(0), channel(8), channel(16));
    let end = Color32::from_rgb(channel(24), channel(32), channel(40));
    let band_count = 3.0 + (channel(48) % 5) as f32;

    let size = GENERATED_ARTWORK_SIZE;
    let mut image = ColorImage::new([size, size], vec![Color32::BLACK; size * size]);
    for y in 0..size {
        for x in 0..size {
            let u = x as f32 / (size - 1) as f32;
            let v = y as f32 / (size - 1) as f32;
            let mut color = lerp_color(start, end, (u + v) / 2.0);
            let du = u - 0.5;
            let dv = v - 0.5;
            let ring = ((du * du + dv * dv).sqrt() * band_count * 2.0).fract();
            if ring < 0.5 {
                color = darken(color, 0.12);
            }
            image.pixels[y * size + x] = color;
        }
    }

    Artwork {
        image,
        hash,
        generated: true,
    }
}

fn hash_bytes(data: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn decode_artwork_image_fails_on_garbage_input() {
        let result = decode_artwork_image(&[0u8, 1u8, 2u8, 3u8]);
        assert!(result.is_err());
    }

    #[test]
    fn remote_urls_are_not_fetched() {
        let url = Url::parse("https://f4.bcbits.com/img/a3629485078_10.jpg").unwrap();
        assert!(fetch_artwork_bytes(&url).unwrap().is_none());
    }

    #[test]
    fn missing_local_file_reports_path() {
        let path = env::temp_dir().join("physical_media_demo_no_such_cover.png");
        let url = Url::from_file_path(&path).unwrap();
        let err = fetch_artwork_bytes(&url).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read artwork"));
    }

    #[test]
    fn generated_artwork_is_deterministic_per_url() {
        let a = Url::parse("https://example.com/a.jpg").unwrap();
        let b = Url::parse("https://example.com/b.jpg").unwrap();
        let first = generated_artwork(&a);
        let again = generated_artwork(&a);
        let other = generated_artwork(&b);
        assert!(first.generated);
        assert_eq!(first.image.size, [GENERATED_ARTWORK_SIZE; 2]);
        assert_eq!(first.hash, again.hash);
        assert_eq!(first.image.pixels, again.image.pixels);
        assert_ne!(first.hash, other.hash);
    }

    #[test]
    fn loader_decodes_local_png() {
        let path = env::temp_dir().join(format!(
            "physical_media_demo_cover_{}.png",
            std::process::id()
        ));
        let cover = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        cover.save(&path).unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let ctx = egui::Context::default();
        let mut loader = ArtworkLoader::default();
        assert!(loader.artwork(&ctx, &url).is_none());

        let deadline = Instant::now() + Duration::from_secs(5);
        let artwork = loop {
            if let Some(artwork) = loader.artwork(&ctx, &url) {
                break artwork;
            }
            assert!(Instant::now() < deadline, "artwork never arrived");
            thread::sleep(Duration::from_millis(10));
        };
        let _ = fs::remove_file(&path);

        assert!(!artwork.generated);
        assert_eq!(artwork.image.size, [4, 2]);
        assert_eq!(artwork.image.pixels[0], Color32::from_rgb(10, 20, 30));
        assert!(loader.last_error().is_none());
    }
}
