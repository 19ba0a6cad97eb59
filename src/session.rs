use std::time::Instant;

use eframe::egui::Color32;

use crate::{
    params::{unit_interval, MediaType, RenderParameters},
    reload::{PreviewSelection, ReloadDebounceController, ReloadSettings},
    timer::{Clock, SystemClock},
};

/// The form's state: the current parameter snapshot plus the reload
/// controller that every edit signals.
#[derive(Debug)]
pub struct DemoSession<C: Clock = SystemClock> {
    params: RenderParameters,
    reload: ReloadDebounceController<C>,
}

impl<C: Clock> DemoSession<C> {
    pub fn new(clock: C, params: RenderParameters, settings: ReloadSettings) -> Self {
        Self {
            params,
            reload: ReloadDebounceController::new(clock, settings),
        }
    }

    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    pub fn reload(&self) -> &ReloadDebounceController<C> {
        &self.reload
    }

    pub fn set_artwork_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.params.artwork_url != url {
            log::debug!("artwork url -> {url:?}");
            self.params.artwork_url = url;
            self.reload.on_parameter_changed();
        }
    }

    /// Switching media type swaps the renderer but is not a parameter edit,
    /// so it does not trigger a reload.
    pub fn set_media_type(&mut self, media_type: MediaType) {
        if self.params.media_type != media_type {
            log::debug!("media type -> {}", media_type.label());
            self.params.media_type = media_type;
        }
    }

    pub fn set_color(&mut self, color: Color32) {
        if self.params.color != color {
            log::debug!("color -> {color:?}");
            self.params.color = color;
            self.reload.on_parameter_changed();
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        let Some(opacity) = unit_interval(opacity) else {
            return;
        };
        if self.params.opacity != opacity {
            log::debug!("opacity -> {opacity:.2}");
            self.params.opacity = opacity;
            self.reload.on_parameter_changed();
        }
    }

    pub fn set_scale(&mut self, scale: f32) {
        let Some(scale) = unit_interval(scale) else {
            return;
        };
        if self.params.scale != scale {
            log::debug!("scale -> {scale:.2}");
            self.params.scale = scale;
            self.reload.on_parameter_changed();
        }
    }

    /// Pumps due reload timers. Call once per frame before reading the
    /// preview selection.
    pub fn tick(&mut self) -> bool {
        self.reload.advance()
    }

    pub fn preview(&self) -> PreviewSelection {
        self.reload.select_preview(&self.params)
    }

    pub fn currently_reloading(&self) -> bool {
        self.reload.currently_reloading()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.reload.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{reload::DebouncePolicy, timer::ManualClock};

    fn session() -> (ManualClock, DemoSession<ManualClock>) {
        let clock = ManualClock::new();
        let session = DemoSession::new(
            clock.clone(),
            RenderParameters::default(),
            ReloadSettings {
                delay: Duration::from_secs(1),
                policy: DebouncePolicy::Restart,
            },
        );
        (clock, session)
    }

    #[test]
    fn edits_trigger_reload() {
        let edits: [fn(&mut DemoSession<ManualClock>); 4] = [
            |s| s.set_artwork_url("https://example.com/cover.png"),
            |s| s.set_color(Color32::from_rgb(10, 200, 90)),
            |s| s.set_opacity(0.9),
            |s| s.set_scale(0.3),
        ];

        for edit in edits {
            let (_, mut session) = session();
            edit(&mut session);
            assert!(session.currently_reloading());
            assert_eq!(session.preview(), PreviewSelection::ShowPlaceholder);
        }
    }

    #[test]
    fn unchanged_values_do_not_trigger_reload() {
        let (_, mut session) = session();
        let params = session.params().clone();
        session.set_artwork_url(params.artwork_url.clone());
        session.set_color(params.color);
        session.set_opacity(params.opacity);
        session.set_scale(params.scale);
        assert!(!session.currently_reloading());
        assert_eq!(session.reload().pending_timers(), 0);
    }

    #[test]
    fn media_type_switch_does_not_reload() {
        let (_, mut session) = session();
        session.set_media_type(MediaType::CompactCassette);
        assert_eq!(session.params().media_type, MediaType::CompactCassette);
        assert!(!session.currently_reloading());
        match session.preview() {
            PreviewSelection::ShowPreview { media_type, .. } => {
                assert_eq!(media_type, MediaType::CompactCassette)
            }
            PreviewSelection::ShowPlaceholder => panic!("expected a preview"),
        }
    }

    #[test]
    fn opacity_and_scale_are_clamped() {
        let (_, mut session) = session();
        session.set_opacity(4.0);
        session.set_scale(-1.0);
        assert_eq!(session.params().opacity, 1.0);
        assert_eq!(session.params().scale, 0.0);

        session.set_scale(f32::NAN);
        assert_eq!(session.params().scale, 0.0);
    }

    #[test]
    fn preview_returns_after_tick_past_deadline() {
        let (clock, mut session) = session();
        session.set_scale(0.5);
        assert_eq!(session.preview(), PreviewSelection::ShowPlaceholder);

        clock.advance(Duration::from_secs(1));
        assert!(session.tick());
        assert_ne!(session.preview(), PreviewSelection::ShowPlaceholder);
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn late_edit_without_tick_keeps_placeholder() {
        let clock = ManualClock::new();
        let mut session = DemoSession::new(
            clock.clone(),
            RenderParameters::default(),
            ReloadSettings {
                delay: Duration::from_secs(1),
                policy: DebouncePolicy::Overlapping,
            },
        );
        session.set_opacity(0.2);
        clock.advance(Duration::from_millis(1500));
        session.set_opacity(0.3);

        clock.advance(Duration::from_millis(10));
        session.tick();
        assert_eq!(session.preview(), PreviewSelection::ShowPlaceholder);
    }

    #[test]
    fn invalid_url_keeps_placeholder_after_reload() {
        let (clock, mut session) = session();
        session.set_artwork_url("not a url");
        clock.advance(Duration::from_secs(2));
        session.tick();
        assert!(!session.currently_reloading());
        assert_eq!(session.preview(), PreviewSelection::ShowPlaceholder);
    }
}
