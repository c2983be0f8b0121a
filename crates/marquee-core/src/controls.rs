//! Auto-hiding control overlay
//!
//! [`ControlsVisibility`] owns one hide timer and at most one opacity fade.
//! Every reschedule aborts the previous task and bumps a generation counter,
//! so a stale task that already woke up finds its generation outdated and does
//! nothing. Hiding only flips `visible` once the fade-out has completed.

use crate::types::PlaybackState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Delay before visible controls fade out
pub const DEFAULT_HIDE_DELAY: Duration = Duration::from_millis(4000);

/// Length of the fade in/out
pub const DEFAULT_ANIMATION_DURATION: Duration = Duration::from_millis(200);

/// Overlay timing options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlsOptions {
    pub hide_delay: Duration,
    pub animation_duration: Duration,
    /// Initial paused flag
    pub is_paused: bool,
}

impl Default for ControlsOptions {
    fn default() -> Self {
        Self {
            hide_delay: DEFAULT_HIDE_DELAY,
            animation_duration: DEFAULT_ANIMATION_DURATION,
            is_paused: false,
        }
    }
}

/// Linear opacity animation
#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f64,
    to: f64,
    start: Instant,
    duration: Duration,
}

impl Fade {
    fn settled(value: f64) -> Self {
        Self {
            from: value,
            to: value,
            start: Instant::now(),
            duration: Duration::ZERO,
        }
    }

    fn value_at(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        let t = (elapsed / self.duration.as_secs_f64()).min(1.0);
        self.from + (self.to - self.from) * t
    }
}

#[derive(Debug)]
struct Inner {
    visible: bool,
    fade: Fade,
    paused: bool,
    hide_timer: Option<JoinHandle<()>>,
    timer_generation: u64,
    animation: Option<JoinHandle<()>>,
    fade_generation: u64,
    disposed: bool,
}

struct Shared {
    options: ControlsOptions,
    inner: Mutex<Inner>,
    visible_tx: watch::Sender<bool>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_visible(&self, inner: &mut Inner, visible: bool) {
        if inner.visible != visible {
            debug!(visible, "Controls visibility changed");
        }
        inner.visible = visible;
        self.visible_tx.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
    }

    fn cancel_timer(inner: &mut Inner) {
        if let Some(handle) = inner.hide_timer.take() {
            handle.abort();
        }
        inner.timer_generation += 1;
    }

    fn start_fade(self: &Arc<Self>, inner: &mut Inner, to: f64, hides: bool) {
        if let Some(handle) = inner.animation.take() {
            handle.abort();
        }
        inner.fade_generation += 1;

        let now = Instant::now();
        let duration = self.options.animation_duration;
        inner.fade = Fade {
            from: inner.fade.value_at(now),
            to,
            start: now,
            duration,
        };

        let shared = Arc::clone(self);
        let generation = inner.fade_generation;
        inner.animation = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            shared.finish_fade(generation, hides);
        }));
    }

    fn finish_fade(&self, generation: u64, hides: bool) {
        let mut inner = self.lock();
        if inner.disposed || inner.fade_generation != generation {
            return;
        }
        inner.animation = None;
        if hides {
            self.set_visible(&mut inner, false);
        }
    }

    fn show_locked(self: &Arc<Self>, inner: &mut Inner) {
        if inner.disposed {
            return;
        }
        Self::cancel_timer(inner);
        self.start_fade(inner, 1.0, false);
        self.set_visible(inner, true);
        self.reset_timer_locked(inner);
    }

    fn hide_locked(self: &Arc<Self>, inner: &mut Inner) {
        if inner.disposed {
            return;
        }
        self.start_fade(inner, 0.0, true);
    }

    fn reset_timer_locked(self: &Arc<Self>, inner: &mut Inner) {
        Self::cancel_timer(inner);
        if inner.paused || inner.disposed {
            return;
        }

        let shared = Arc::clone(self);
        let generation = inner.timer_generation;
        let delay = self.options.hide_delay;
        inner.hide_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire_timer(generation);
        }));
    }

    fn fire_timer(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if inner.disposed || inner.timer_generation != generation {
            return;
        }
        inner.hide_timer = None;
        debug!("Hide timer fired");
        self.hide_locked(&mut inner);
    }

    fn set_paused(self: &Arc<Self>, paused: bool) {
        let mut inner = self.lock();
        if inner.paused == paused {
            return;
        }
        inner.paused = paused;

        if paused {
            self.show_locked(&mut inner);
            Self::cancel_timer(&mut inner);
        } else {
            self.reset_timer_locked(&mut inner);
        }
    }
}

/// Control overlay visibility for one mounted player view.
///
/// Dropping it unmounts: the pending timer, the running fade and any playback
/// follower are cancelled.
pub struct ControlsVisibility {
    shared: Arc<Shared>,
    follower: Option<JoinHandle<()>>,
}

impl ControlsVisibility {
    /// Mount the overlay and show it immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(options: ControlsOptions) -> Self {
        let (visible_tx, _) = watch::channel(true);
        let shared = Arc::new(Shared {
            options,
            inner: Mutex::new(Inner {
                visible: true,
                fade: Fade::settled(1.0),
                paused: options.is_paused,
                hide_timer: None,
                timer_generation: 0,
                animation: None,
                fade_generation: 0,
                disposed: false,
            }),
            visible_tx,
        });

        let controls = Self {
            shared,
            follower: None,
        };
        controls.show_controls();
        controls
    }

    /// Timing options the overlay was mounted with
    pub fn options(&self) -> ControlsOptions {
        self.shared.options
    }

    /// Fade in, mark visible and restart the hide countdown
    pub fn show_controls(&self) {
        let mut inner = self.shared.lock();
        self.shared.show_locked(&mut inner);
    }

    /// Fade out; visibility drops once the fade completes
    pub fn hide_controls(&self) {
        let mut inner = self.shared.lock();
        self.shared.hide_locked(&mut inner);
    }

    /// Restart the hide countdown, or cancel it while paused
    pub fn reset_hide_timer(&self) {
        let mut inner = self.shared.lock();
        self.shared.reset_timer_locked(&mut inner);
    }

    /// Show hidden controls, or extend the visible window
    pub fn handle_user_interaction(&self) {
        let mut inner = self.shared.lock();
        if inner.visible {
            self.shared.reset_timer_locked(&mut inner);
        } else {
            self.shared.show_locked(&mut inner);
        }
    }

    /// Update the paused flag. Pausing pins the controls on screen.
    pub fn set_paused(&self, paused: bool) {
        self.shared.set_paused(paused);
    }

    /// Track a playback machine's paused flag
    pub fn follow(&mut self, state_rx: watch::Receiver<PlaybackState>) {
        if let Some(handle) = self.follower.take() {
            handle.abort();
        }

        let shared = Arc::clone(&self.shared);
        let mut rx = state_rx;
        self.follower = Some(tokio::spawn(async move {
            loop {
                let paused = rx.borrow_and_update().paused;
                shared.set_paused(paused);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }));
    }

    /// True while the controls are on screen
    pub fn is_visible(&self) -> bool {
        self.shared.lock().visible
    }

    /// Last paused flag seen by the overlay
    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    /// Current overlay opacity in `[0, 1]`
    pub fn opacity(&self) -> f64 {
        self.shared.lock().fade.value_at(Instant::now())
    }

    /// True while a hide countdown is scheduled
    pub fn has_pending_hide(&self) -> bool {
        self.shared.lock().hide_timer.is_some()
    }

    /// Subscribe to visibility changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.visible_tx.subscribe()
    }

    /// Unmount explicitly
    pub fn unmount(self) {}
}

impl Drop for ControlsVisibility {
    fn drop(&mut self) {
        if let Some(handle) = self.follower.take() {
            handle.abort();
        }

        let mut inner = self.shared.lock();
        inner.disposed = true;
        Shared::cancel_timer(&mut inner);
        if let Some(handle) = inner.animation.take() {
            handle.abort();
        }
        debug!("Controls unmounted");
    }
}

impl std::fmt::Debug for ControlsVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("ControlsVisibility")
            .field("options", &self.shared.options)
            .field("visible", &inner.visible)
            .field("paused", &inner.paused)
            .field("pending_hide", &inner.hide_timer.is_some())
            .finish()
    }
}
