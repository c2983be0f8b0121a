//! Simulated playback for the terminal player
//!
//! Stands in for the platform media component: it advances a virtual clock on
//! every tick, reports progress to the state machine and honours seek and
//! pause commands.

use anyhow::bail;
use indicatif::{ProgressBar, ProgressStyle};
use marquee_core::{
    ControlsVisibility, LoadInfo, MarqueeConfig, MediaRecord, MediaSurface, PlaybackMachine,
    PlaybackState, PlayerPhase, ProgressInfo,
};
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error};

/// Options for one playback run
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    pub seek: Option<f64>,
    pub fail: Option<String>,
    pub speed: f64,
}

#[derive(Debug, Default)]
struct Clock {
    position: f64,
    paused: bool,
}

/// Virtual media element
#[derive(Debug, Clone, Default)]
pub struct SimulatedMedia {
    clock: Arc<Mutex<Clock>>,
}

impl SimulatedMedia {
    /// Advance by `seconds` unless paused and return the new position
    fn advance(&self, seconds: f64) -> f64 {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        if !clock.paused {
            clock.position += seconds;
        }
        clock.position
    }
}

impl MediaSurface for SimulatedMedia {
    fn seek(&mut self, to_seconds: f64) {
        debug!(to = to_seconds, "Simulated seek");
        self.clock.lock().unwrap_or_else(PoisonError::into_inner).position = to_seconds;
    }

    fn set_paused(&mut self, paused: bool) {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner).paused = paused;
    }
}

fn progress_bar() -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos:>3}% {msg}",
    )?);
    Ok(bar)
}

/// Play `item` to the end, or until the simulated media fails
pub async fn run(
    item: &MediaRecord,
    config: &MarqueeConfig,
    mut options: PlayOptions,
) -> anyhow::Result<(PlayerPhase, PlaybackState)> {
    if !(options.speed.is_finite() && options.speed > 0.0) {
        bail!("speed must be a positive number, got {}", options.speed);
    }

    let media = SimulatedMedia::default();
    let mut machine = PlaybackMachine::new()
        .with_error_callback(|message| error!(error = %message, "Video error"));
    machine.attach(Box::new(media.clone()));

    let mut controls = ControlsVisibility::mount(config.controls.options(machine.state().paused));
    controls.follow(machine.subscribe_state());

    let interval = Duration::from_millis(config.playback.progress_interval_ms);
    let step = interval.as_secs_f64() * options.speed;

    // Media takes one tick to load
    tokio::time::sleep(interval).await;
    machine.handle_load(LoadInfo::new(item.duration));

    if let Some(delta) = options.seek {
        machine.seek(delta);
        controls.handle_user_interaction();
    }

    let bar = progress_bar()?;
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let position = media.advance(step);
        if position >= machine.state().duration {
            machine.handle_end();
            break;
        }
        machine.handle_progress(ProgressInfo::new(position));

        if let Some(message) = options.fail.take() {
            machine.handle_error(&json!({ "error": { "errorString": message } }));
            break;
        }

        bar.set_position(machine.progress_percentage() as u64);
        bar.set_message(format!(
            "{} / {}{}",
            machine.current_time_text(),
            machine.duration_text(),
            if controls.is_visible() { "  [controls]" } else { "" }
        ));
    }

    bar.finish_and_clear();
    controls.unmount();

    Ok((machine.phase(), machine.state().clone()))
}
