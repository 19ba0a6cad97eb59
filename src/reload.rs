use std::time::{Duration, Instant};

use serde::Deserialize;
use url::Url;

use crate::{
    params::{MediaType, RenderParameters},
    timer::{Clock, SystemClock, TimerQueue, TimerToken},
};

pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_secs(1);

/// How a new parameter change interacts with a reload timer that is still
/// pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebouncePolicy {
    /// Cancel the pending timer and start a fresh one, so the flag clears one
    /// delay after the last change.
    #[default]
    Restart,
    /// Every change schedules its own timer and none is cancelled. The first
    /// timer to fire clears the flag even if a later change is still fresh.
    Overlapping,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReloadSettings {
    pub delay: Duration,
    pub policy: DebouncePolicy,
}

impl Default for ReloadSettings {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RELOAD_DELAY,
            policy: DebouncePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReloadState {
    pub needs_reload: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewSelection {
    ShowPreview {
        media_type: MediaType,
        params: RenderParameters,
        artwork_url: Url,
    },
    ShowPlaceholder,
}

/// Decides whether the preview is shown or replaced by a loading placeholder
/// while parameter edits are still settling.
///
/// Timers only fire from [`ReloadDebounceController::advance`], which the UI
/// calls once per frame, so every state transition happens on one thread in
/// one total order.
#[derive(Debug)]
pub struct ReloadDebounceController<C: Clock = SystemClock> {
    clock: C,
    settings: ReloadSettings,
    state: ReloadState,
    timers: TimerQueue,
    current_timer: Option<TimerToken>,
}

impl<C: Clock> ReloadDebounceController<C> {
    pub fn new(clock: C, settings: ReloadSettings) -> Self {
        Self {
            clock,
            settings,
            state: ReloadState::default(),
            timers: TimerQueue::new(),
            current_timer: None,
        }
    }

    pub fn on_parameter_changed(&mut self) {
        // Timers that expired before this change fire first.
        let now = self.clock.now();
        self.fire_due(now);
        self.state.needs_reload = true;

        if self.settings.policy == DebouncePolicy::Restart {
            if let Some(token) = self.current_timer.take() {
                self.timers.cancel(token);
            }
        }

        let deadline = now + self.settings.delay;
        self.current_timer = Some(self.timers.schedule(deadline));
        log::debug!(
            "parameter changed; reload pending ({} timer(s) in flight)",
            self.timers.len()
        );
    }

    pub fn currently_reloading(&self) -> bool {
        self.state.needs_reload
    }

    pub fn reload_state(&self) -> ReloadState {
        self.state
    }

    pub fn select_preview(&self, params: &RenderParameters) -> PreviewSelection {
        if self.currently_reloading() {
            return PreviewSelection::ShowPlaceholder;
        }

        match Url::parse(&params.artwork_url) {
            Ok(artwork_url) => PreviewSelection::ShowPreview {
                media_type: params.media_type,
                params: params.clone(),
                artwork_url,
            },
            Err(_) => PreviewSelection::ShowPlaceholder,
        }
    }

    /// Fires every timer that is due. Returns `true` if the reload state
    /// changed.
    pub fn advance(&mut self) -> bool {
        if self.timers.is_empty() {
            return false;
        }

        let before = self.state;
        self.fire_due(self.clock.now());
        self.state != before
    }

    fn fire_due(&mut self, now: Instant) {
        while let Some(token) = self.timers.pop_due(now) {
            if self.current_timer == Some(token) {
                self.current_timer = None;
            }
            self.state.needs_reload = false;
            log::debug!("reload timer fired; preview released");
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}
