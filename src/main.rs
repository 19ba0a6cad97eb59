mod config;
mod media;
mod params;
mod reload;
mod session;
mod timer;

use crate::{
    config::Config,
    media::{present, PaintedMedia},
    params::MediaType,
    reload::{PreviewSelection, ReloadState},
    session::DemoSession,
    timer::SystemClock,
};
use eframe::egui::{self, CornerRadius, RichText, ViewportBuilder};
use std::time::{Duration, Instant};

const FORM_SECTION_RADIUS: u8 = 8;
const FORM_SECTION_PADDING: i8 = 10;
const PREVIEW_MIN_HEIGHT: f32 = 200.0;
const IDLE_REPAINT_INTERVAL: Duration = Duration::from_millis(500);

struct App {
    session: DemoSession<SystemClock>,
    renderer: PaintedMedia,
}

impl App {
    fn new(config: Config) -> Self {
        let Config {
            reload,
            defaults,
            render,
        } = config;
        log::info!(
            "reload delay {:.2}s, {:?} policy",
            reload.delay.as_secs_f32(),
            reload.policy
        );

        Self {
            session: DemoSession::new(SystemClock, defaults, reload),
            renderer: PaintedMedia::new(render),
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.tick();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.spacing_mut().item_spacing.y = 10.0;
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("Physical Media Demo").strong());
            });

            self.render_media_type_picker(ui);
            self.render_preview(ui);
            self.render_form(ui);
            self.render_status(ui);
        });

        ctx.request_repaint_after(self.repaint_interval());
    }
}

impl App {
    /// Wake up in time for the next reload timer even if nothing else moves.
    fn repaint_interval(&self) -> Duration {
        match self.session.next_deadline() {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(IDLE_REPAINT_INTERVAL),
            None => IDLE_REPAINT_INTERVAL,
        }
    }

    fn render_media_type_picker(&mut self, ui: &mut egui::Ui) {
        let mut selected = self.session.params().media_type;
        ui.horizontal(|row| {
            for media_type in MediaType::ALL {
                row.selectable_value(&mut selected, media_type, media_type.label());
            }
        });
        self.session.set_media_type(selected);
    }

    fn render_preview(&mut self, ui: &mut egui::Ui) {
        let height = (ui.available_height() * 0.5).max(PREVIEW_MIN_HEIGHT);
        let width = ui.available_width();

        ui.allocate_ui_with_layout(
            egui::vec2(width, height),
            egui::Layout::centered_and_justified(egui::Direction::TopDown),
            |preview| match self.session.preview() {
                PreviewSelection::ShowPreview {
                    media_type,
                    params,
                    artwork_url,
                } => {
                    present(&mut self.renderer, preview, media_type, &params, &artwork_url);
                }
                PreviewSelection::ShowPlaceholder => {
                    render_placeholder(preview);
                }
            },
        );
    }

    fn render_form(&mut self, ui: &mut egui::Ui) {
        let params = self.session.params().clone();

        form_section(ui, |section| {
            section.label(RichText::new("🌐 Album Artwork URL").small().strong());
            let mut url = params.artwork_url.clone();
            let edit = egui::TextEdit::singleline(&mut url)
                .hint_text("https://example.com/artwork")
                .desired_width(f32::INFINITY);
            if section.add(edit).changed() {
                self.session.set_artwork_url(url);
            }
        });

        if params.media_type.supports_color() {
            form_section(ui, |section| {
                section.horizontal(|row| {
                    row.label(RichText::new("Media Color").small().strong());
                    let mut color = params.color;
                    if egui::color_picker::color_edit_button_srgba(
                        row,
                        &mut color,
                        egui::color_picker::Alpha::Opaque,
                    )
                    .changed()
                    {
                        self.session.set_color(color);
                    }
                });
                section.label(RichText::new("Opacity").small().strong());
                let mut opacity = params.opacity;
                if section
                    .add(egui::Slider::new(&mut opacity, 0.0..=1.0))
                    .changed()
                {
                    self.session.set_opacity(opacity);
                }
            });
        }

        form_section(ui, |section| {
            section.label(RichText::new("Model Scale").small().strong());
            let mut scale = params.scale;
            if section
                .add(egui::Slider::new(&mut scale, 0.0..=1.0))
                .changed()
            {
                self.session.set_scale(scale);
            }
        });
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        let reload = self.session.reload();
        let ReloadState { needs_reload } = reload.reload_state();
        let status = if needs_reload {
            format!("Reloading preview… ({} timer(s) pending)", reload.pending_timers())
        } else {
            "Preview up to date".to_string()
        };
        ui.horizontal(|row| {
            row.label(RichText::new(status).small().weak());
            if let Some(err) = self.renderer.artwork_error() {
                row.label(RichText::new(err).small().color(row.visuals().warn_fg_color));
            }
        });
    }
}

fn form_section<R>(ui: &mut egui::Ui, build: impl FnOnce(&mut egui::Ui) -> R) -> R {
    egui::Frame::group(ui.style())
        .corner_radius(CornerRadius::same(FORM_SECTION_RADIUS))
        .inner_margin(egui::Margin::same(FORM_SECTION_PADDING))
        .fill(ui.visuals().faint_bg_color)
        .show(ui, |section| {
            section.set_width(section.available_width());
            build(section)
        })
        .inner
}

/// Shown both while edits settle and while the URL does not parse.
fn render_placeholder(ui: &mut egui::Ui) {
    ui.vertical_centered(|center| {
        center.add_space((center.available_height() / 2.0 - 24.0).max(0.0));
        center.add(egui::Spinner::new().size(24.0));
        center.label(RichText::new("Loading preview").small().weak());
    });
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::load().unwrap_or_else(|err| {
        log::warn!("{err:#}; using built-in defaults");
        Config::default()
    });

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([420.0, 720.0])
            .with_min_inner_size([320.0, 480.0]),
        ..Default::default()
    };
    log::info!("starting Physical Media Demo");
    let run_res = eframe::run_native(
        "Physical Media Demo",
        native_options,
        Box::new(
            |_cc| -> std::result::Result<
                Box<dyn eframe::App>,
                Box<dyn std::error::Error + Send + Sync>,
            > { Ok(Box::new(App::new(config))) },
        ),
    );
    if let Err(e) = run_res {
        return Err(Box::new(e));
    }

    Ok(())
}
