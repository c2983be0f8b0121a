//! Playback state machine
//!
//! [`PlaybackMachine`] is the single source of truth for the playback view. It
//! never talks to a decoder directly: the platform media component reports
//! load/progress/error/end events through the `handle_*` methods and receives
//! commands through an attached [`MediaSurface`].
//!
//! Seeking is optimistic. `current_time` is written before the media layer
//! confirms the seek, and the next progress event wins even if it is stale.

use crate::types::{LoadInfo, PlaybackState, PlayerPhase, ProgressInfo, SessionId};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Message shown when a playback failure carries no usable text
pub const PLAYBACK_FALLBACK_ERROR: &str = "Video playback failed. Please try again.";

/// Command surface of the platform media component
pub trait MediaSurface: Send {
    /// Seek to an absolute position in seconds
    fn seek(&mut self, to_seconds: f64);

    /// Follow the machine's paused flag
    fn set_paused(&mut self, _paused: bool) {}
}

/// Callback receiving normalized playback error messages
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Playback state machine for one mounted player view
pub struct PlaybackMachine {
    /// Session ID for log correlation
    id: SessionId,
    /// Current state
    state: PlaybackState,
    /// Set by the end event until playback is driven again
    ended: bool,
    /// Attached media component
    media: Option<Box<dyn MediaSurface>>,
    /// External error callback
    on_error: Option<ErrorCallback>,
    /// State change broadcaster
    state_tx: watch::Sender<PlaybackState>,
    /// Phase change broadcaster
    phase_tx: watch::Sender<PlayerPhase>,
}

impl PlaybackMachine {
    /// Create a machine in the initial loading state
    pub fn new() -> Self {
        let state = PlaybackState::default();
        let (state_tx, _) = watch::channel(state.clone());
        let (phase_tx, _) = watch::channel(PlayerPhase::Loading);

        Self {
            id: SessionId::new(),
            state,
            ended: false,
            media: None,
            on_error: None,
            state_tx,
            phase_tx,
        }
    }

    /// Install the external error callback
    pub fn with_error_callback(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Attach the media component that receives seek commands
    pub fn attach(&mut self, mut media: Box<dyn MediaSurface>) {
        media.set_paused(self.state.paused);
        self.media = Some(media);
        debug!(session_id = %self.id, "Media surface attached");
    }

    /// Detach the media component
    pub fn detach(&mut self) -> Option<Box<dyn MediaSurface>> {
        self.media.take()
    }

    /// True while a media surface is attached
    pub fn is_attached(&self) -> bool {
        self.media.is_some()
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Get current state
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Current coarse phase
    pub fn phase(&self) -> PlayerPhase {
        if self.state.error.is_some() {
            PlayerPhase::Error
        } else if self.state.loading {
            PlayerPhase::Loading
        } else if self.ended && self.state.paused {
            PlayerPhase::Ended
        } else if self.state.paused {
            PlayerPhase::Paused
        } else {
            PlayerPhase::Playing
        }
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to phase changes
    pub fn subscribe_phase(&self) -> watch::Receiver<PlayerPhase> {
        self.phase_tx.subscribe()
    }

    /// Publish the current state and forward paused changes to the media layer
    fn publish(&mut self) {
        let previous = self.state_tx.send_replace(self.state.clone());

        if previous.paused != self.state.paused {
            if let Some(media) = self.media.as_mut() {
                media.set_paused(self.state.paused);
            }
        }

        let phase = self.phase();
        let from = self.phase_tx.send_replace(phase);
        if from != phase {
            info!(session_id = %self.id, from = %from, to = %phase, "Phase transition");
        }
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    /// Flip the paused flag. Allowed in every phase.
    pub fn toggle_play_pause(&mut self) {
        self.state.paused = !self.state.paused;
        if !self.state.paused {
            self.ended = false;
        }
        self.publish();
    }

    /// Seek relative to the current position, clamped to `[0, duration]`.
    ///
    /// Does nothing when no media surface is attached.
    pub fn seek(&mut self, delta_seconds: f64) {
        let Some(media) = self.media.as_mut() else {
            debug!(delta = delta_seconds, "Seek ignored, no media attached");
            return;
        };

        let target = (self.state.current_time + delta_seconds)
            .min(self.state.duration)
            .max(0.0);

        info!(from = self.state.current_time, to = target, "Seeking");
        media.seek(target);

        self.state.current_time = target;
        self.ended = false;
        self.publish();
    }

    /// Store a volume clamped to `[0, 1]`. NaN is ignored.
    pub fn set_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            warn!("Ignoring NaN volume");
            return;
        }
        self.state.volume = volume.clamp(0.0, 1.0);
        self.publish();
    }

    /// Flip the muted flag; volume is left untouched
    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
        self.publish();
    }

    // ------------------------------------------------------------------
    // Media events
    // ------------------------------------------------------------------

    /// Media finished loading.
    ///
    /// Always resumes playback and unmutes, whatever the user chose before.
    pub fn handle_load(&mut self, info: LoadInfo) {
        info!(session_id = %self.id, duration = info.duration, "Media loaded");

        self.state.loading = false;
        self.state.duration = info.duration;
        self.state.error = None;
        self.state.paused = false;
        self.state.muted = false;
        self.ended = false;
        self.publish();
    }

    /// Playback position reported by the media layer, taken verbatim
    pub fn handle_progress(&mut self, info: ProgressInfo) {
        self.state.current_time = info.current_time;
        self.publish();
    }

    /// Media layer failure
    pub fn handle_error(&mut self, payload: &Value) {
        let message = normalize_error(payload);
        warn!(session_id = %self.id, error = %message, "Playback failed");

        self.state.loading = false;
        self.state.error = Some(message.clone());
        self.publish();

        if let Some(callback) = self.on_error.as_mut() {
            callback(&message);
        }
    }

    /// Media reached the end
    pub fn handle_end(&mut self) {
        info!(session_id = %self.id, "Playback ended");

        self.state.paused = true;
        self.state.current_time = 0.0;
        self.ended = true;
        self.publish();
    }

    // ------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------

    /// Played share of the content in `[0, 100]`
    pub fn progress_percentage(&self) -> f64 {
        progress_percentage(self.state.current_time, self.state.duration)
    }

    /// Current position as `M:SS`
    pub fn current_time_text(&self) -> String {
        format_time(self.state.current_time)
    }

    /// Duration as `M:SS`
    pub fn duration_text(&self) -> String {
        format_time(self.state.duration)
    }

    /// Suggested skip distance for the loaded content
    pub fn seek_step(&self) -> f64 {
        seek_step(self.state.duration)
    }

    /// Seconds left until the end
    pub fn time_remaining(&self) -> f64 {
        time_remaining(self.state.current_time, self.state.duration)
    }
}

impl Default for PlaybackMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlaybackMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackMachine")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("ended", &self.ended)
            .field("attached", &self.media.is_some())
            .finish()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Turn a media error payload into display text.
///
/// The first present field of `error.errorString`, `error.localizedDescription`,
/// `message` or the payload itself (when it is a string) decides the result;
/// anything that is not non-empty text falls back to
/// [`PLAYBACK_FALLBACK_ERROR`].
pub fn normalize_error(payload: &Value) -> String {
    let nested = payload.get("error");
    let candidates = [
        nested.and_then(|e| e.get("errorString")),
        nested.and_then(|e| e.get("localizedDescription")),
        payload.get("message"),
        Some(payload).filter(|p| p.is_string()),
    ];

    match candidates.into_iter().flatten().find(|v| is_truthy(v)) {
        Some(Value::String(message)) => message.clone(),
        _ => PLAYBACK_FALLBACK_ERROR.to_string(),
    }
}

/// Format a position as `M:SS`.
///
/// Negative, NaN, infinite and missing inputs format as `0:00`.
pub fn format_time(seconds: impl Into<Option<f64>>) -> String {
    match seconds.into() {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let mins = (s / 60.0).floor() as u64;
            let secs = (s % 60.0).floor() as u64;
            format!("{}:{:02}", mins, secs)
        }
        _ => "0:00".to_string(),
    }
}

/// Format a position as `H:MM:SS` past the hour, `M:SS` below it
pub fn format_clock(seconds: impl Into<Option<f64>>) -> String {
    match seconds.into() {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let total = s.floor() as u64;
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let secs = total % 60;
            if hours > 0 {
                format!("{}:{:02}:{:02}", hours, minutes, secs)
            } else {
                format!("{}:{:02}", minutes, secs)
            }
        }
        _ => "0:00".to_string(),
    }
}

/// Percentage of `duration` covered by `current_time`, in `[0, 100]`
pub fn progress_percentage(current_time: f64, duration: f64) -> f64 {
    if duration == 0.0 {
        return 0.0;
    }
    let percentage = current_time / duration * 100.0;
    if percentage.is_nan() {
        return 0.0;
    }
    percentage.clamp(0.0, 100.0)
}

/// Skip distance in seconds for content of the given duration
pub fn seek_step(duration: f64) -> f64 {
    if duration > 3600.0 {
        30.0
    } else if duration > 1800.0 {
        15.0
    } else {
        10.0
    }
}

/// Seconds left until the end, never negative
pub fn time_remaining(current_time: f64, duration: f64) -> f64 {
    (duration - current_time).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingMedia {
        seeks: Arc<Mutex<Vec<f64>>>,
        paused: Arc<Mutex<Vec<bool>>>,
    }

    impl MediaSurface for RecordingMedia {
        fn seek(&mut self, to_seconds: f64) {
            self.seeks.lock().unwrap().push(to_seconds);
        }

        fn set_paused(&mut self, paused: bool) {
            self.paused.lock().unwrap().push(paused);
        }
    }

    fn attached_machine(duration: f64) -> (PlaybackMachine, RecordingMedia) {
        let media = RecordingMedia::default();
        let mut machine = PlaybackMachine::new();
        machine.attach(Box::new(media.clone()));
        machine.handle_load(LoadInfo::new(duration));
        (machine, media)
    }

    #[test]
    fn test_initial_state() {
        let machine = PlaybackMachine::new();
        assert_eq!(machine.state(), &PlaybackState::default());
        assert_eq!(machine.phase(), PlayerPhase::Loading);
    }

    #[test]
    fn test_toggle_play_pause() {
        let mut machine = PlaybackMachine::new();
        machine.toggle_play_pause();
        assert!(machine.state().paused);
        machine.toggle_play_pause();
        assert!(!machine.state().paused);
    }

    #[test]
    fn test_toggle_allowed_after_error() {
        let mut machine = PlaybackMachine::new();
        machine.handle_error(&json!("boom"));
        machine.toggle_play_pause();
        assert!(machine.state().paused);
        assert_eq!(machine.phase(), PlayerPhase::Error);
    }

    #[test]
    fn test_load_resets_flags() {
        let mut machine = PlaybackMachine::new();
        machine.toggle_play_pause();
        machine.toggle_mute();
        machine.handle_error(&json!({"message": "stale"}));

        machine.handle_load(LoadInfo::new(120.5));

        let state = machine.state();
        assert!(!state.loading);
        assert_eq!(state.duration, 120.5);
        assert!(!state.paused);
        assert!(!state.muted);
        assert!(state.error.is_none());
        assert_eq!(machine.phase(), PlayerPhase::Playing);
    }

    #[test]
    fn test_progress_is_not_clamped() {
        let (mut machine, _) = attached_machine(100.0);
        machine.handle_progress(ProgressInfo::new(120.0));
        assert_eq!(machine.state().current_time, 120.0);
        assert_eq!(machine.progress_percentage(), 100.0);
    }

    #[test]
    fn test_seek_clamps_and_commands_media() {
        let (mut machine, media) = attached_machine(100.0);
        machine.handle_progress(ProgressInfo::new(95.0));

        machine.seek(10.0);
        assert_eq!(machine.state().current_time, 100.0);

        machine.seek(-1000.0);
        assert_eq!(machine.state().current_time, 0.0);

        machine.seek(10.0);
        assert_eq!(machine.state().current_time, 10.0);

        assert_eq!(*media.seeks.lock().unwrap(), vec![100.0, 0.0, 10.0]);
    }

    #[test]
    fn test_seek_without_media_is_noop() {
        let mut machine = PlaybackMachine::new();
        machine.handle_load(LoadInfo::new(100.0));
        machine.handle_progress(ProgressInfo::new(50.0));

        machine.seek(10.0);
        assert_eq!(machine.state().current_time, 50.0);
    }

    #[test]
    fn test_stale_progress_overwrites_optimistic_seek() {
        let (mut machine, _) = attached_machine(100.0);
        machine.handle_progress(ProgressInfo::new(20.0));
        machine.seek(30.0);
        assert_eq!(machine.state().current_time, 50.0);

        machine.handle_progress(ProgressInfo::new(20.5));
        assert_eq!(machine.state().current_time, 20.5);
    }

    #[test]
    fn test_end_pauses_and_rewinds() {
        let (mut machine, media) = attached_machine(60.0);
        machine.handle_progress(ProgressInfo::new(60.0));

        machine.handle_end();

        assert!(machine.state().paused);
        assert_eq!(machine.state().current_time, 0.0);
        assert_eq!(machine.state().duration, 60.0);
        assert_eq!(machine.phase(), PlayerPhase::Ended);
        assert_eq!(media.paused.lock().unwrap().last(), Some(&true));

        machine.toggle_play_pause();
        assert_eq!(machine.phase(), PlayerPhase::Playing);
    }

    #[test]
    fn test_error_invokes_callback() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let mut machine = PlaybackMachine::new()
            .with_error_callback(move |msg| sink.lock().unwrap().push(msg.to_string()));

        machine.handle_error(&json!({"error": {"errorString": "Network connection failed"}}));

        assert!(!machine.state().loading);
        assert_eq!(machine.state().error.as_deref(), Some("Network connection failed"));
        assert_eq!(*received.lock().unwrap(), vec!["Network connection failed".to_string()]);
    }

    #[test]
    fn test_normalize_error_priority() {
        let payload = json!({
            "error": {"errorString": "A", "localizedDescription": "B"},
            "message": "C"
        });
        assert_eq!(normalize_error(&payload), "A");
        assert_eq!(normalize_error(&json!({"error": {"localizedDescription": "B"}, "message": "C"})), "B");
        assert_eq!(normalize_error(&json!({"error": {"errorString": ""}, "message": "C"})), "C");
        assert_eq!(normalize_error(&json!("plain")), "plain");
    }

    #[test]
    fn test_normalize_error_fallback() {
        assert_eq!(normalize_error(&Value::Null), PLAYBACK_FALLBACK_ERROR);
        assert_eq!(normalize_error(&json!({})), PLAYBACK_FALLBACK_ERROR);
        assert_eq!(normalize_error(&json!("")), PLAYBACK_FALLBACK_ERROR);
        assert_eq!(normalize_error(&json!({"message": 42})), PLAYBACK_FALLBACK_ERROR);
        assert_eq!(normalize_error(&json!({"error": "just a string"})), PLAYBACK_FALLBACK_ERROR);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(125.9), "2:05");
        assert_eq!(format_time(3661.0), "61:01");
    }

    #[test]
    fn test_format_time_invalid() {
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(-10.0), "0:00");
        assert_eq!(format_time(None), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(59.0), "0:59");
        assert_eq!(format_clock(3661.0), "1:01:01");
        assert_eq!(format_clock(-1.0), "0:00");
    }

    #[test]
    fn test_progress_percentage() {
        assert_eq!(progress_percentage(0.0, 0.0), 0.0);
        assert_eq!(progress_percentage(50.0, 100.0), 50.0);
        assert_eq!(progress_percentage(100.0, 100.0), 100.0);
        assert_eq!(progress_percentage(-5.0, 100.0), 0.0);
        assert_eq!(progress_percentage(f64::NAN, 100.0), 0.0);
        assert_eq!(progress_percentage(10.0, f64::NAN), 0.0);
        assert_eq!(progress_percentage(f64::INFINITY, f64::INFINITY), 0.0);
        assert_eq!(progress_percentage(30.0, f64::INFINITY), 0.0);
        assert_eq!(progress_percentage(f64::INFINITY, 100.0), 100.0);
    }

    #[test]
    fn test_live_stream_progress_stays_in_range() {
        let mut machine = PlaybackMachine::new();
        machine.handle_load(LoadInfo::new(f64::INFINITY));
        machine.handle_progress(ProgressInfo::new(f64::INFINITY));

        let percentage = machine.progress_percentage();
        assert!((0.0..=100.0).contains(&percentage), "got {}", percentage);
        assert_eq!(machine.duration_text(), "0:00");
    }

    #[test]
    fn test_volume_clamping() {
        let mut machine = PlaybackMachine::new();
        machine.set_volume(0.5);
        assert_eq!(machine.state().volume, 0.5);
        machine.set_volume(1.5);
        assert_eq!(machine.state().volume, 1.0);
        machine.set_volume(-0.5);
        assert_eq!(machine.state().volume, 0.0);
        machine.set_volume(f64::NAN);
        assert_eq!(machine.state().volume, 0.0);
    }

    #[test]
    fn test_toggle_mute_keeps_volume() {
        let mut machine = PlaybackMachine::new();
        machine.set_volume(0.3);
        machine.toggle_mute();
        assert!(machine.state().muted);
        assert_eq!(machine.state().volume, 0.3);
        machine.toggle_mute();
        assert!(!machine.state().muted);
    }

    #[test]
    fn test_seek_step_and_remaining() {
        assert_eq!(seek_step(600.0), 10.0);
        assert_eq!(seek_step(2000.0), 15.0);
        assert_eq!(seek_step(7200.0), 30.0);
        assert_eq!(time_remaining(30.0, 100.0), 70.0);
        assert_eq!(time_remaining(130.0, 100.0), 0.0);
    }

    #[test]
    fn test_state_subscription() {
        let mut machine = PlaybackMachine::new();
        let state_rx = machine.subscribe_state();
        let phase_rx = machine.subscribe_phase();

        machine.handle_load(LoadInfo::new(42.0));
        machine.toggle_play_pause();

        assert_eq!(state_rx.borrow().duration, 42.0);
        assert!(state_rx.borrow().paused);
        assert_eq!(*phase_rx.borrow(), PlayerPhase::Paused);
    }
}
