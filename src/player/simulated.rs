//! Scriptable media element for driving the player in tests.

use super::media::{MediaElement, MediaEvent, MediaEventBus};
use crate::error::{ReelshelfError, Result};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct State {
    source: Option<String>,
    loads: Vec<String>,
    paused: bool,
    current_time: f64,
    duration: f64,
    volume: f64,
    muted: bool,
    rate: f64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            source: None,
            loads: Vec::new(),
            paused: true,
            current_time: 0.0,
            duration: f64::NAN,
            volume: 1.0,
            muted: false,
            rate: 1.0,
        }
    }
}

/// Cloned handles share state, so a test keeps one while the player owns the
/// other.
#[derive(Debug, Clone, Default)]
pub struct SimulatedMedia {
    state: Arc<Mutex<State>>,
    bus: MediaEventBus,
}

impl SimulatedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn stop(&self) {
        let was_playing = {
            let mut state = self.state();
            !std::mem::replace(&mut state.paused, true)
        };
        if was_playing {
            self.bus.emit(MediaEvent::Pause);
        }
    }

    pub fn loads(&self) -> Vec<String> {
        self.state().loads.clone()
    }

    pub fn source(&self) -> Option<String> {
        self.state().source.clone()
    }

    /// Signal that the current source is ready to play.
    pub fn finish_loading(&self, duration: f64) {
        self.state().duration = duration;
        self.bus.emit(MediaEvent::DurationChange(duration));
        self.bus.emit(MediaEvent::LoadedData);
    }

    pub fn fail_loading(&self, message: &str) {
        self.stop();
        self.bus.emit(MediaEvent::Error(message.to_string()));
    }

    /// A pause the player did not ask for.
    pub fn stall(&self) {
        self.stop();
    }

    pub fn tick(&self, seconds: f64) {
        let position = {
            let mut state = self.state();
            if state.paused {
                return;
            }
            state.current_time += seconds * state.rate;
            state.current_time
        };
        self.bus.emit(MediaEvent::TimeUpdate(position));
    }
}

impl MediaElement for SimulatedMedia {
    fn events(&self) -> &MediaEventBus {
        &self.bus
    }

    fn load(&mut self, url: &str) {
        self.stop();
        let mut state = self.state();
        state.source = Some(url.to_string());
        state.loads.push(url.to_string());
        state.current_time = 0.0;
        state.duration = f64::NAN;
    }

    fn unload(&mut self) {
        self.stop();
        self.state().source = None;
    }

    fn play(&mut self) -> Result<()> {
        let started = {
            let mut state = self.state();
            if state.source.is_none() {
                return Err(ReelshelfError::Media("no source loaded".to_string()));
            }
            std::mem::replace(&mut state.paused, false)
        };
        if started {
            self.bus.emit(MediaEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.stop();
    }

    fn paused(&self) -> bool {
        self.state().paused
    }

    fn current_time(&self) -> f64 {
        self.state().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.state().current_time = seconds;
        self.bus.emit(MediaEvent::TimeUpdate(seconds));
    }

    fn duration(&self) -> f64 {
        self.state().duration
    }

    fn volume(&self) -> f64 {
        self.state().volume
    }

    fn set_volume(&mut self, volume: f64) {
        let muted = {
            let mut state = self.state();
            state.volume = volume;
            state.muted
        };
        self.bus.emit(MediaEvent::VolumeChange { volume, muted });
    }

    fn muted(&self) -> bool {
        self.state().muted
    }

    fn set_muted(&mut self, muted: bool) {
        let volume = {
            let mut state = self.state();
            state.muted = muted;
            state.volume
        };
        self.bus.emit(MediaEvent::VolumeChange { volume, muted });
    }

    fn playback_rate(&self) -> f64 {
        self.state().rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.state().rate = rate;
        self.bus.emit(MediaEvent::RateChange(rate));
    }
}
